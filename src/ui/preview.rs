/// Full-screen preview overlay
///
/// A small state machine (`Closed` or `Open(index)`) plus the modal view
/// that renders over the gallery: the selected image contained within the
/// viewport, previous/next controls only when the move is valid (no
/// wraparound), a close button and backdrop dismissal.

use iced::widget::{button, column, container, horizontal_space, image, mouse_area, opaque, row, stack, text};
use iced::{Alignment, Color, ContentFit, Element, Length, Theme};

use crate::gallery::data::GalleryImage;
use crate::Message;

/// Which image, if any, is open in the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preview {
    #[default]
    Closed,
    Open(usize),
}

impl Preview {
    pub fn open(&mut self, index: usize) {
        *self = Preview::Open(index);
    }

    pub fn close(&mut self) {
        *self = Preview::Closed;
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Preview::Closed => None,
            Preview::Open(index) => Some(*index),
        }
    }

    /// A "previous" move is valid only when not at the first image
    pub fn has_previous(&self) -> bool {
        matches!(self, Preview::Open(index) if *index > 0)
    }

    /// A "next" move is valid only when not at the last image
    pub fn has_next(&self, len: usize) -> bool {
        matches!(self, Preview::Open(index) if index + 1 < len)
    }

    pub fn previous(&mut self) {
        if let Preview::Open(index) = self {
            if *index > 0 {
                *index -= 1;
            }
        }
    }

    pub fn next(&mut self, len: usize) {
        if let Preview::Open(index) = self {
            if *index + 1 < len {
                *index += 1;
            }
        }
    }

    /// Repair the state after the displayed sequence shrank: an
    /// out-of-range index snaps to the last valid one, or to `Closed`
    /// when the sequence is empty.
    pub fn clamp(&mut self, len: usize) {
        if let Preview::Open(index) = self {
            if len == 0 {
                *self = Preview::Closed;
            } else if *index >= len {
                *index = len - 1;
            }
        }
    }
}

/// Lay the preview modal over `base` when the preview is open.
/// With the preview closed (or pointing past the sequence, which the
/// shell's clamping prevents) the base is returned untouched.
pub fn overlay<'a>(
    base: Element<'a, Message>,
    images: &'a [GalleryImage],
    state: Preview,
) -> Element<'a, Message> {
    let Preview::Open(index) = state else {
        return base;
    };
    let Some(record) = images.get(index) else {
        return base;
    };

    let full = image(image::Handle::from_path(&record.url))
        .content_fit(ContentFit::Contain)
        .width(Length::Fill)
        .height(Length::Fill);

    let mut controls = row![].spacing(16).align_y(Alignment::Center);
    if state.has_previous() {
        controls = controls.push(
            button(text("◀").size(22))
                .style(button::text)
                .on_press(Message::PreviousImage),
        );
    }
    controls = controls.push(full);
    if state.has_next(images.len()) {
        controls = controls.push(
            button(text("▶").size(22))
                .style(button::text)
                .on_press(Message::NextImage),
        );
    }

    let close_bar = row![
        horizontal_space(),
        button(text("✕").size(18))
            .style(button::text)
            .on_press(Message::ClosePreview),
    ];

    let panel = container(column![close_bar, controls].spacing(8))
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(16);

    // Clicks on the panel stay on the panel; clicks on the surrounding
    // backdrop dismiss the preview.
    let backdrop = mouse_area(
        container(opaque(panel))
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(48)
            .style(backdrop_style),
    )
    .on_press(Message::ClosePreview);

    stack![base, opaque(backdrop)].into()
}

fn backdrop_style(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(
            Color {
                a: 0.85,
                ..Color::BLACK
            }
            .into(),
        ),
        ..container::Style::default()
    }
}
