/// User interface module
///
/// View components for the gallery screen:
/// - Top bar with the upload and logout actions (header.rs)
/// - Responsive image grid (grid.rs)
/// - Full-screen preview overlay and its state machine (preview.rs)
/// - Upload panel and the accepted-file filter (upload.rs)
///
/// All components are pure functions of their inputs; every user action
/// is reported upward as a `Message` and handled by the shell.

pub mod grid;
pub mod header;
pub mod preview;
pub mod upload;
