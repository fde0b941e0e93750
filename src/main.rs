use iced::widget::{button, center, column, container, scrollable, text};
use iced::{event, window, Alignment, Element, Event, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;

// Declare the application modules
mod backend;
mod error;
mod gallery;
mod ui;

use backend::local::LocalBackend;
use backend::User;
use error::GalleryError;
use gallery::data::{GalleryImage, UploadReport};
use gallery::service::GalleryService;
use ui::preview::Preview;
use ui::upload;

/// Which top-level screen is showing
enum Screen {
    /// Session check still in flight at startup
    Starting,
    /// No session; the unauthenticated entry point
    SignedOut,
    /// The gallery proper
    Gallery(GalleryState),
}

/// Client-local, ephemeral gallery state. Dropped wholesale on logout,
/// which resets selection and panel visibility to their defaults.
struct GalleryState {
    /// The currently displayed sequence, newest first
    images: Vec<GalleryImage>,
    /// True until the first listing attempt settles
    loading: bool,
    /// The last listing attempt failed
    load_error: bool,
    /// Preview overlay selection
    preview: Preview,
    upload_panel_open: bool,
}

impl Default for GalleryState {
    fn default() -> Self {
        GalleryState {
            images: Vec::new(),
            loading: true,
            load_error: false,
            preview: Preview::Closed,
            upload_panel_open: false,
        }
    }
}

/// Main application state
struct GalleryApp {
    /// Gallery data service over the backend collaborator
    service: GalleryService,
    screen: Screen,
    /// Status message to display to the user
    status: String,
    /// Last known window width, drives the grid's column count
    window_width: f32,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// Startup session check finished
    SessionChecked(Result<Option<User>, GalleryError>),
    /// User clicked "Sign in" on the signed-out screen
    SignIn,
    SignedIn(Result<User, GalleryError>),
    /// A listing fetch finished
    ImagesLoaded(Result<Vec<GalleryImage>, GalleryError>),
    /// User asked to retry a failed listing fetch
    RetryLoad,
    OpenUploadPanel,
    CloseUploadPanel,
    /// User clicked "Browse" in the upload panel
    BrowseFiles,
    /// The OS dropped a file onto the window
    FileDropped(PathBuf),
    /// An upload batch settled, fully or partially
    UploadFinished(UploadReport),
    /// User clicked a grid tile
    TileClicked(usize),
    /// User clicked a tile's delete button
    DeleteImage(usize),
    DeleteFinished(Result<(), GalleryError>),
    ClosePreview,
    PreviousImage,
    NextImage,
    Logout,
    LoggedOut(Result<(), GalleryError>),
    WindowResized(f32),
}

impl GalleryApp {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        // Initialize the backend under the user's data directory.
        // If this fails, we panic because the app cannot function
        // without its backend.
        let data_root = dirs::data_dir()
            .or_else(dirs::home_dir)
            .expect("Could not determine user data directory")
            .join("gallery");
        let backend = LocalBackend::open(&data_root)
            .expect("Failed to initialize gallery backend. Check permissions and disk space.");

        println!("📁 Gallery backend at: {}", data_root.display());

        let service = GalleryService::new(backend);
        let check = {
            let service = service.clone();
            Task::perform(
                async move { service.current_user().await },
                Message::SessionChecked,
            )
        };

        (
            GalleryApp {
                service,
                screen: Screen::Starting,
                status: String::from("Ready."),
                window_width: 1280.0,
            },
            check,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SessionChecked(Ok(Some(_))) => self.enter_gallery(),
            Message::SessionChecked(Ok(None)) => {
                self.screen = Screen::SignedOut;
                Task::none()
            }
            Message::SessionChecked(Err(e)) => {
                self.screen = Screen::SignedOut;
                self.status = format!("⚠️ {e}");
                Task::none()
            }

            Message::SignIn => {
                let service = self.service.clone();
                Task::perform(async move { service.sign_in().await }, Message::SignedIn)
            }
            Message::SignedIn(Ok(_)) => self.enter_gallery(),
            Message::SignedIn(Err(e)) => {
                self.status = format!("⚠️ Sign-in failed: {e}");
                Task::none()
            }

            Message::ImagesLoaded(result) => {
                if let Screen::Gallery(state) = &mut self.screen {
                    match result {
                        Ok(images) => {
                            state.images = images;
                            state.loading = false;
                            state.load_error = false;
                            // The list may have shrunk under an open preview
                            state.preview.clamp(state.images.len());
                        }
                        Err(e) => {
                            state.loading = false;
                            state.load_error = true;
                            self.status = format!("⚠️ {e}");
                        }
                    }
                }
                Task::none()
            }
            Message::RetryLoad => {
                if let Screen::Gallery(state) = &mut self.screen {
                    state.loading = true;
                    state.load_error = false;
                    return self.refresh();
                }
                Task::none()
            }

            Message::OpenUploadPanel => {
                if let Screen::Gallery(state) = &mut self.screen {
                    state.upload_panel_open = true;
                }
                Task::none()
            }
            Message::CloseUploadPanel => {
                if let Screen::Gallery(state) = &mut self.screen {
                    state.upload_panel_open = false;
                }
                Task::none()
            }
            Message::BrowseFiles => {
                // Native picker, blocking like the rest of the event loop
                let picked = FileDialog::new()
                    .set_title("Select images to upload")
                    .add_filter("Images", &upload::PICKER_EXTENSIONS)
                    .pick_files();

                match picked {
                    Some(files) => self.accept_batch(files),
                    None => Task::none(),
                }
            }
            Message::FileDropped(path) => {
                // Drops only count while the upload panel is showing
                match &self.screen {
                    Screen::Gallery(state) if state.upload_panel_open => {
                        self.accept_batch(vec![path])
                    }
                    _ => Task::none(),
                }
            }
            Message::UploadFinished(report) => {
                // The panel closes whether or not every file made it
                if let Screen::Gallery(state) = &mut self.screen {
                    state.upload_panel_open = false;
                }
                self.status = summarize_upload(&report);
                println!(
                    "📊 Upload batch settled: {} ok, {} failed",
                    report.uploaded.len(),
                    report.failures.len()
                );
                self.refresh()
            }

            Message::TileClicked(index) => {
                if let Screen::Gallery(state) = &mut self.screen {
                    if index < state.images.len() {
                        state.preview.open(index);
                    }
                }
                Task::none()
            }
            Message::DeleteImage(index) => {
                if let Screen::Gallery(state) = &self.screen {
                    if let Some(record) = state.images.get(index) {
                        let service = self.service.clone();
                        let storage_path = record.storage_path.clone();
                        let id = record.id;
                        return Task::perform(
                            async move { service.delete_image(storage_path, id).await },
                            Message::DeleteFinished,
                        );
                    }
                }
                Task::none()
            }
            Message::DeleteFinished(Ok(())) => {
                self.status = String::from("🗑 Image deleted.");
                self.refresh()
            }
            Message::DeleteFinished(Err(e)) => {
                self.status = format!("⚠️ Delete failed: {e}");
                Task::none()
            }

            Message::ClosePreview => {
                if let Screen::Gallery(state) = &mut self.screen {
                    state.preview.close();
                }
                Task::none()
            }
            Message::PreviousImage => {
                if let Screen::Gallery(state) = &mut self.screen {
                    state.preview.previous();
                }
                Task::none()
            }
            Message::NextImage => {
                if let Screen::Gallery(state) = &mut self.screen {
                    state.preview.next(state.images.len());
                }
                Task::none()
            }

            Message::Logout => {
                let service = self.service.clone();
                Task::perform(async move { service.sign_out().await }, Message::LoggedOut)
            }
            Message::LoggedOut(Ok(())) => {
                // Teardown: gallery state (selection, panel) is dropped here
                self.screen = Screen::SignedOut;
                self.status = String::from("Signed out.");
                Task::none()
            }
            Message::LoggedOut(Err(e)) => {
                // Session and screen stay exactly as they were
                self.status = format!("⚠️ {e}");
                Task::none()
            }

            Message::WindowResized(width) => {
                self.window_width = width;
                Task::none()
            }
        }
    }

    /// Switch to the gallery screen and kick off the initial listing
    fn enter_gallery(&mut self) -> Task<Message> {
        self.screen = Screen::Gallery(GalleryState::default());
        self.status = String::from("Signed in.");
        self.refresh()
    }

    /// Fetch the listing (served from the cache when one is held)
    fn refresh(&self) -> Task<Message> {
        let service = self.service.clone();
        Task::perform(
            async move { service.list_images().await },
            Message::ImagesLoaded,
        )
    }

    /// Filter a candidate batch and hand the accepted files to the service
    fn accept_batch(&mut self, files: Vec<PathBuf>) -> Task<Message> {
        let accepted = upload::accepted_files(files);
        if accepted.is_empty() {
            self.status = String::from("No supported image files in selection.");
            return Task::none();
        }

        // Reported immediately, before any backend confirmation
        self.status = format!("📤 {} image(s) added to upload batch", accepted.len());

        let service = self.service.clone();
        Task::perform(
            async move { service.upload_images(accepted).await },
            Message::UploadFinished,
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        match &self.screen {
            Screen::Starting => center(text("Checking session…").size(16)).into(),
            Screen::SignedOut => self.signed_out_view(),
            Screen::Gallery(state) => self.gallery_view(state),
        }
    }

    fn signed_out_view(&self) -> Element<Message> {
        center(
            column![
                text("🖼 Gallery").size(48),
                button("Sign in").on_press(Message::SignIn).padding(10),
                text(&self.status).size(14),
            ]
            .spacing(20)
            .align_x(Alignment::Center),
        )
        .into()
    }

    fn gallery_view<'a>(&'a self, state: &'a GalleryState) -> Element<'a, Message> {
        let mut content = column![ui::header::view()];

        if state.upload_panel_open {
            content = content.push(container(upload::view()).padding(16));
        }

        let body: Element<Message> = if state.loading {
            center(text("Loading images…").size(16)).into()
        } else if state.load_error {
            center(
                column![
                    text("Could not load images.").size(16),
                    button("Retry").on_press(Message::RetryLoad),
                ]
                .spacing(12)
                .align_x(Alignment::Center),
            )
            .into()
        } else if state.images.is_empty() {
            center(text("No images yet. Upload some!").size(16)).into()
        } else {
            scrollable(ui::grid::view(&state.images, self.window_width))
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
        };
        content = content.push(body);

        content = content.push(
            container(text(&self.status).size(14))
                .width(Length::Fill)
                .padding(8),
        );

        ui::preview::overlay(content.into(), &state.images, state.preview)
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size.width)),
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// One status line for a settled batch; failures are listed individually
fn summarize_upload(report: &UploadReport) -> String {
    if report.failures.is_empty() {
        format!("✅ Uploaded {} image(s)", report.uploaded.len())
    } else {
        let details: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.file.display(), f.reason))
            .collect();
        format!(
            "⚠️ {} of {} uploads failed ({})",
            report.failures.len(),
            report.total(),
            details.join("; ")
        )
    }
}

fn main() -> iced::Result {
    iced::application("Gallery", GalleryApp::update, GalleryApp::view)
        .subscription(GalleryApp::subscription)
        .theme(GalleryApp::theme)
        .centered()
        .run_with(GalleryApp::new)
}
