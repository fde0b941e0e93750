/// Top bar: application title plus the upload and logout actions

use iced::widget::{button, container, horizontal_space, row, text};
use iced::{Alignment, Element, Length, Theme};

use crate::Message;

pub fn view<'a>() -> Element<'a, Message> {
    container(
        row![
            text("🖼 Gallery").size(20),
            horizontal_space(),
            button("Upload").on_press(Message::OpenUploadPanel),
            button("Logout")
                .style(button::secondary)
                .on_press(Message::Logout),
        ]
        .spacing(12)
        .align_y(Alignment::Center),
    )
    .width(Length::Fill)
    .padding(12)
    .style(bar_style)
    .into()
}

fn bar_style(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        background: Some(palette.background.weak.color.into()),
        ..container::Style::default()
    }
}
