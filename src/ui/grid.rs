/// Responsive image grid
///
/// Pure rendering of the current image sequence into square tiles.
/// Column count follows the viewport width (1/2/3/4 columns), each tile
/// shows a cover-fit thumbnail with a month/year caption and a delete
/// button that only appears on hover. Clicking a tile opens the preview
/// at that index; the delete button consumes its own click.

use iced::widget::{button, column, container, hover, image, mouse_area, row, stack, text};
use iced::{alignment, border, Color, ContentFit, Element, Length, Theme};

use crate::gallery::data::GalleryImage;
use crate::Message;

const SPACING: f32 = 16.0;
const PADDING: f32 = 16.0;

/// Column count per viewport width breakpoint
pub fn columns_for_width(width: f32) -> usize {
    if width < 640.0 {
        1
    } else if width < 960.0 {
        2
    } else if width < 1280.0 {
        3
    } else {
        4
    }
}

/// Render the image sequence as a tile grid sized for `width`
pub fn view(images: &[GalleryImage], width: f32) -> Element<'_, Message> {
    let cols = columns_for_width(width);
    let side =
        ((width - 2.0 * PADDING - SPACING * (cols as f32 - 1.0)) / cols as f32).max(96.0);

    let mut grid = column![].spacing(SPACING).padding(PADDING);
    for (row_index, chunk) in images.chunks(cols).enumerate() {
        let mut tiles = row![].spacing(SPACING);
        for (col_index, record) in chunk.iter().enumerate() {
            tiles = tiles.push(tile(record, row_index * cols + col_index, side));
        }
        grid = grid.push(tiles);
    }
    grid.into()
}

/// One square tile: thumbnail, caption overlay, hover-revealed delete
fn tile(record: &GalleryImage, index: usize, side: f32) -> Element<'_, Message> {
    let thumbnail = image(image::Handle::from_path(&record.url))
        .width(Length::Fill)
        .height(Length::Fill)
        .content_fit(ContentFit::Cover);

    let caption = container(
        container(text(record.created_at.format("%B %Y").to_string()).size(13))
            .padding(6)
            .style(caption_style),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .align_y(alignment::Vertical::Bottom)
    .padding(8);

    let base = mouse_area(
        container(stack![thumbnail, caption])
            .width(side)
            .height(side),
    )
    .interaction(iced::mouse::Interaction::Pointer)
    .on_press(Message::TileClicked(index));

    // The delete button sits on top, so its click never reaches the tile
    let delete = container(
        button(text("🗑").size(14))
            .style(button::danger)
            .on_press(Message::DeleteImage(index)),
    )
    .width(Length::Fill)
    .align_x(alignment::Horizontal::Right)
    .padding(8);

    hover(base, delete)
}

fn caption_style(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(
            Color {
                a: 0.6,
                ..Color::BLACK
            }
            .into(),
        ),
        text_color: Some(Color::WHITE),
        border: border::rounded(4.0),
        ..container::Style::default()
    }
}
