/// Upload control
///
/// The drop-zone panel plus the filter that decides which files enter an
/// upload batch. Accepted formats are the gallery's fixed set: jpeg, jpg,
/// png, gif and webp, matched by extension (case-insensitive). The panel
/// never uploads anything itself; an accepted batch is reported upward
/// unchanged.

use iced::widget::{button, column, container, row, text};
use iced::{Alignment, Color, Element, Length, Theme};
use image::ImageFormat;
use std::path::{Path, PathBuf};

use crate::Message;

/// Extensions offered by the native file picker
pub const PICKER_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// Keep only the files the gallery accepts, preserving order
pub fn accepted_files(files: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    files.into_iter().filter(|f| is_accepted(f)).collect()
}

/// A file is accepted when its extension maps to one of the supported
/// image formats
pub fn is_accepted(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .and_then(ImageFormat::from_extension)
        .is_some_and(|format| {
            matches!(
                format,
                ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP
            )
        })
}

/// The upload panel: a drop target with a browse fallback
pub fn view<'a>() -> Element<'a, Message> {
    container(
        column![
            text("Drag & drop images here").size(18),
            text("or browse to select files").size(14),
            row![
                button("Browse…").on_press(Message::BrowseFiles),
                button("Cancel")
                    .style(button::secondary)
                    .on_press(Message::CloseUploadPanel),
            ]
            .spacing(12),
        ]
        .spacing(10)
        .align_x(Alignment::Center),
    )
    .width(Length::Fill)
    .padding(24)
    .style(drop_zone_style)
    .into()
}

fn drop_zone_style(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        border: iced::Border {
            color: palette.background.strong.color,
            width: 2.0,
            radius: 8.0.into(),
        },
        background: Some(
            Color {
                a: 0.3,
                ..palette.background.weak.color
            }
            .into(),
        ),
        ..container::Style::default()
    }
}
