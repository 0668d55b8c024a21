use std::ops::Range;

use ecoleta_core::{
    Coordinate, Pending,
    map::{OSM_ATTRIBUTION, tile_url},
};
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap,
        canvas::{Canvas, Map as WorldMap, MapResolution},
    },
};

use crate::app::{App, Focus, ITEM_COLUMNS, Select};

/// Height of a category tile including its border.
const TILE_HEIGHT: u16 = 4;
/// Most options a dropdown shows at once.
const DROPDOWN_ROWS: u16 = 10;

/// Screen regions, shared by drawing and mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Areas {
    pub header: Rect,
    pub name: Rect,
    pub email: Rect,
    pub whatsapp: Rect,
    pub state: Rect,
    pub city: Rect,
    pub items: Rect,
    pub submit: Rect,
    pub map: Rect,
    pub status: Rect,
}

impl Areas {
    pub(crate) fn select(&self, select: Select) -> Rect {
        match select {
            Select::State => self.state,
            Select::City => self.city,
        }
    }
}

pub(crate) fn layout(area: Rect) -> Areas {
    // Outer layout: title, form + map, status line
    let [header, body, status] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .margin(1)
    .areas(area);

    let [form, map] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);

    let [name, contact, address, items, submit] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(TILE_HEIGHT + 2),
        Constraint::Length(3),
    ])
    .areas(form);

    let [email, whatsapp] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(contact);
    let [state, city] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(address);

    Areas {
        header,
        name,
        email,
        whatsapp,
        state,
        city,
        items,
        submit,
        map,
        status,
    }
}

/// Inner canvas area of the map block.
pub(crate) fn map_canvas(map: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(map)
}

/// Rows of tiles the items block shows at once.
fn item_rows(items: Rect) -> usize {
    let inner = Block::default().borders(Borders::ALL).inner(items);
    usize::from((inner.height / TILE_HEIGHT).max(1))
}

/// Catalog indices on screen, scrolled by whole rows so `cursor` stays visible.
pub(crate) fn item_window(len: usize, cursor: usize, visible_rows: usize) -> Range<usize> {
    let rows = dropdown_window(
        len.div_ceil(ITEM_COLUMNS),
        cursor / ITEM_COLUMNS,
        visible_rows,
    );
    (rows.start * ITEM_COLUMNS).min(len)..(rows.end * ITEM_COLUMNS).min(len)
}

/// Tile rectangles for the categories in `window`, the first one top left.
pub(crate) fn item_tiles(items: Rect, window: Range<usize>) -> Vec<Rect> {
    let inner = Block::default().borders(Borders::ALL).inner(items);
    let columns = u16::try_from(ITEM_COLUMNS).unwrap_or(1);
    let width = inner.width / columns;
    if width == 0 {
        return Vec::new();
    }

    (0..window.len())
        .map_while(|offset| {
            let offset = u16::try_from(offset).ok()?;
            let x = inner.x + (offset % columns) * width;
            let y = inner.y.checked_add((offset / columns).checked_mul(TILE_HEIGHT)?)?;
            (y < inner.bottom()).then(|| Rect::new(x, y, width, TILE_HEIGHT).intersection(inner))
        })
        .collect()
}

/// Visible catalog indices for the grid and the tile drawn for each.
pub(crate) fn item_layout(items: Rect, len: usize, cursor: usize) -> (Range<usize>, Vec<Rect>) {
    let window = item_window(len, cursor, item_rows(items));
    let tiles = item_tiles(items, window.clone());
    (window, tiles)
}

/// Tail of `value` that fits in `width` cells, leaving one cell for the cursor.
fn visible_tail(value: &str, width: usize) -> &str {
    let keep = width.saturating_sub(1);
    let skip = value.chars().count().saturating_sub(keep);
    value
        .char_indices()
        .nth(skip)
        .map_or(if skip == 0 { value } else { "" }, |(at, _)| {
            value.get(at..).unwrap_or_default()
        })
}

fn marker_label(marker: Coordinate) -> String {
    if marker.is_origin() {
        " no marker ".to_owned()
    } else {
        format!(" marker {marker} ")
    }
}

/// Popup below (or, without room, above) the select at `anchor`.
pub(crate) fn dropdown_area(anchor: Rect, options: usize, screen: Rect) -> Rect {
    let rows = u16::try_from(options).unwrap_or(u16::MAX).min(DROPDOWN_ROWS);
    let height = rows + 2;
    let below = anchor.bottom();
    let y = if below + height <= screen.bottom() {
        below
    } else {
        anchor.y.saturating_sub(height)
    };
    Rect::new(anchor.x, y, anchor.width, height).intersection(screen)
}

/// Visible slice of `len` options that keeps `selected` in view.
pub(crate) fn dropdown_window(len: usize, selected: usize, visible: usize) -> Range<usize> {
    if visible == 0 {
        return 0..0;
    }
    let start = selected.saturating_sub(visible - 1).min(len.saturating_sub(visible));
    start..len.min(start + visible)
}

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();
    let areas = layout(area);

    // Title / header
    let header = Paragraph::new("ecoleta – register a waste collection point")
        .block(Block::default().borders(Borders::ALL).title("Ecoleta"));
    frame.render_widget(header, areas.header);

    draw_text_field(frame, app, Focus::Name, "Entity name", areas.name);
    draw_text_field(frame, app, Focus::Email, "E-mail", areas.email);
    draw_text_field(frame, app, Focus::Whatsapp, "WhatsApp", areas.whatsapp);
    draw_select(frame, app, Select::State, "State (UF)", areas.state);
    draw_select(frame, app, Select::City, "City", areas.city);
    draw_items(frame, app, areas.items);
    draw_submit(frame, app, areas.submit);
    draw_map(frame, app, areas.map);
    draw_status(frame, app, areas.status);

    // Popup goes last so it covers the fields below it
    if let Some(dropdown) = app.dropdown {
        draw_dropdown(frame, app, dropdown.select, dropdown.index, &areas, area);
    }
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().fg(Color::Yellow))
    } else {
        block
    }
}

fn draw_text_field(frame: &mut Frame<'_>, app: &App, focus: Focus, title: &str, area: Rect) {
    let value = app.text_value(focus).unwrap_or_default();
    let focused = app.focus == focus;
    let shown = if focused {
        visible_tail(value, usize::from(area.width.saturating_sub(2)))
    } else {
        value
    };
    let paragraph = Paragraph::new(shown).block(field_block(title, focused));
    frame.render_widget(paragraph, area);

    if focused && app.dropdown.is_none() {
        let typed = u16::try_from(shown.chars().count()).unwrap_or(u16::MAX);
        let max_x = area.right().saturating_sub(2);
        frame.set_cursor_position((
            area.x.saturating_add(1).saturating_add(typed).min(max_x),
            area.y + 1,
        ));
    }
}

fn draw_select(frame: &mut Frame<'_>, app: &App, select: Select, title: &str, area: Rect) {
    let focus = match select {
        Select::State => Focus::State,
        Select::City => Focus::City,
    };
    let selected = match select {
        Select::State => app.form.selected_state_index(),
        Select::City => app.form.selected_city_index(),
    };
    let label = app
        .option_labels(select)
        .into_iter()
        .nth(selected)
        .unwrap_or_default();

    let waiting = select == Select::City && app.form.pending().contains(&Pending::Cities);
    let text = if waiting {
        format!("{label} (loading…)")
    } else {
        format!("{label} ▾")
    };

    let style = if selected == 0 {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let paragraph = Paragraph::new(text)
        .style(style)
        .block(field_block(title, app.focus == focus));
    frame.render_widget(paragraph, area);
}

fn draw_dropdown(
    frame: &mut Frame<'_>,
    app: &App,
    select: Select,
    index: usize,
    areas: &Areas,
    screen: Rect,
) {
    let labels = app.option_labels(select);
    let popup = dropdown_area(areas.select(select), labels.len(), screen);
    let visible = usize::from(popup.height.saturating_sub(2));
    let window = dropdown_window(labels.len(), index, visible);

    let items = labels
        .get(window.clone())
        .unwrap_or_default()
        .iter()
        .map(|label| ListItem::new(label.as_str()))
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(format!("{} of {}", index + 1, labels.len())),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(index.saturating_sub(window.start)));
    frame.render_widget(Clear, popup);
    frame.render_stateful_widget(list, popup, &mut state);
}

fn draw_items(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.focus == Focus::Items;
    let catalog = app.form.catalog();
    let selected_count = catalog
        .iter()
        .filter(|category| app.form.is_selected(category.id))
        .count();

    let (window, tiles) = item_layout(area, catalog.len(), app.item_cursor);

    let mut block = field_block("Collection items (Space to toggle)", focused)
        .title_bottom(Line::from(format!(" {selected_count} selected ")).right_aligned());
    if window.len() < catalog.len() {
        block = block.title_bottom(Line::from(format!(
            " {}-{} of {} ",
            window.start + 1,
            window.end,
            catalog.len()
        )));
    }
    frame.render_widget(block, area);

    if catalog.is_empty() {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let text = if app.form.pending().contains(&Pending::Catalog) {
            "Loading items…"
        } else {
            "No items available."
        };
        frame.render_widget(Paragraph::new(text), inner);
        return;
    }

    let shown = catalog.get(window.clone()).unwrap_or_default();
    for (offset, (tile, category)) in tiles.into_iter().zip(shown).enumerate() {
        let index = window.start + offset;
        let selected = app.form.is_selected(category.id);
        let under_cursor = focused && index == app.item_cursor;

        let mut border = Style::default();
        if selected {
            border = border.fg(Color::Green).add_modifier(Modifier::BOLD);
        }
        if under_cursor {
            border = border.fg(Color::Yellow);
        }

        let mark = if selected { "✔ " } else { "" };
        let icon = category
            .icon_url
            .rsplit('/')
            .next()
            .unwrap_or(category.icon_url.as_str());

        let body = vec![
            Line::from(format!("{mark}{}", category.name)),
            Line::from(Span::styled(icon.to_owned(), Style::default().fg(Color::DarkGray))),
        ];
        let paragraph = Paragraph::new(body)
            .block(Block::default().borders(Borders::ALL).border_style(border))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, tile);
    }
}

fn draw_submit(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.focus == Focus::Submit;
    let style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    let button = Paragraph::new("Register collection point")
        .alignment(Alignment::Center)
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(button, area);
}

fn draw_map(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let view = app.map_view();
    let marker = app.form.marker();
    let cursor = app.cursor();
    let focused = app.focus == Focus::Map;
    let tile = tile_url(&app.tile_url, view.center_tile());

    let block = field_block("Location (click or Enter to place the marker)", focused)
        .title(Line::from(format!(" zoom {} ", view.zoom)).right_aligned())
        .title_bottom(Line::from(marker_label(marker)))
        .title_bottom(Line::from(format!(" {OSM_ATTRIBUTION} · {tile} ")).right_aligned());

    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds(view.x_bounds())
        .y_bounds(view.y_bounds())
        .paint(move |ctx| {
            ctx.draw(&WorldMap {
                resolution: MapResolution::High,
                color: Color::Green,
            });
            ctx.layer();
            if focused {
                ctx.print(
                    cursor.longitude,
                    cursor.latitude,
                    Span::styled("+", Style::default().fg(Color::Yellow)),
                );
            }
            if !marker.is_origin() {
                ctx.print(
                    marker.longitude,
                    marker.latitude,
                    Span::styled(
                        "●",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn draw_status(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let nav_hint = match app.focus {
        _ if app.dropdown.is_some() => "↑/↓ choose · Enter confirm · Esc cancel",
        Focus::Name | Focus::Email | Focus::Whatsapp => {
            "Type to edit · Tab/Shift-Tab move · Ctrl-S submit · Ctrl-C quit"
        }
        Focus::State | Focus::City => "Enter open list · Del clear · Tab move · Ctrl-C quit",
        Focus::Items => "Arrows move · Space toggle · Tab move · Ctrl-C quit",
        Focus::Submit => "Enter submit · Tab move · Ctrl-C quit",
        Focus::Map => "Arrows move · Enter place marker · +/- zoom · c recentre · Ctrl-C quit",
    };

    let pending = app.form.pending();
    let status_text = if let Some(msg) = app.form.notice() {
        format!("{msg} · {nav_hint}")
    } else if pending.is_empty() {
        nav_hint.to_owned()
    } else {
        let waiting = pending
            .iter()
            .map(|pending| match pending {
                Pending::Location => "location",
                Pending::Catalog => "items",
                Pending::States => "states",
                Pending::Cities => "cities",
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("Loading {waiting}… · {nav_hint}")
    };

    let status_style = if app.form.notice().is_some() {
        Style::default().fg(Color::Red)
    } else if !pending.is_empty() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ecoleta_core::{Category, CategoryId, FormEvent, FormOptions, FormState};
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::input;

    const SMALL: Rect = Rect::new(0, 0, 80, 24);

    #[test]
    fn layout_places_map_right_of_the_form() {
        let areas = layout(Rect::new(0, 0, 120, 40));
        assert!(areas.map.x >= areas.name.right());
        assert!(areas.email.right() <= areas.whatsapp.x);
        assert!(areas.state.bottom() <= areas.items.y);
        assert_eq!(areas.status.bottom(), 39);
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
        terminal
            .draw(|frame| draw(frame, app))
            .expect("draw into the test backend");
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app_with_catalog(count: u32) -> App {
        let mut app = App::new(FormState::new(FormOptions::default()), 4, String::new());
        let catalog = (1..=count)
            .map(|id| Category {
                id: CategoryId(id),
                name: format!("Item {id}"),
                icon_url: format!("{id}.svg"),
            })
            .collect();
        app.apply(FormEvent::CatalogLoaded(Ok(catalog)));
        app
    }

    #[test]
    fn tiles_fill_rows_of_three() {
        let items = Rect::new(0, 0, 32, 10);
        let tiles = item_tiles(items, 0..6);
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles.first().copied(), Some(Rect::new(1, 1, 10, TILE_HEIGHT)));
        assert_eq!(tiles.get(4).copied(), Some(Rect::new(11, 5, 10, TILE_HEIGHT)));
    }

    #[test]
    fn item_window_scrolls_by_rows() {
        assert_eq!(item_window(6, 0, 1), 0..3);
        assert_eq!(item_window(6, 5, 1), 3..6);
        assert_eq!(item_window(7, 0, 2), 0..6);
        assert_eq!(item_window(7, 6, 2), 3..7);
        assert_eq!(item_window(0, 0, 2), 0..0);
    }

    #[test]
    fn grid_scrolls_to_the_cursor_on_a_small_terminal() {
        let mut app = app_with_catalog(6);
        app.set_focus(Focus::Items);
        for _ in 0..2 {
            input::handle_key_event(
                KeyEvent::new(KeyCode::Down, KeyModifiers::NONE),
                &mut app,
            );
        }
        assert_eq!(app.item_cursor, 5);

        let items = layout(SMALL).items;
        let (window, tiles) = item_layout(items, 6, app.item_cursor);
        assert!(window.contains(&5), "window {window:?} hides the cursor");
        assert_eq!(tiles.len(), window.len());
        assert!(render(&app, SMALL.width, SMALL.height).contains("Item 6"));
    }

    #[test]
    fn unplaced_marker_is_not_drawn() {
        let mut app = app_with_catalog(0);
        let screen = render(&app, SMALL.width, SMALL.height);
        assert!(!screen.contains('●'));
        assert!(screen.contains("no marker"));

        app.apply(FormEvent::MapClicked(Coordinate::new(5.0, 5.0)));
        assert!(render(&app, SMALL.width, SMALL.height).contains('●'));
    }

    #[test]
    fn marker_label_names_the_unplaced_state() {
        assert_eq!(marker_label(Coordinate::ORIGIN), " no marker ");
        assert_eq!(
            marker_label(Coordinate::new(-23.5, -46.6)),
            " marker -23.50000, -46.60000 "
        );
    }

    #[test]
    fn long_values_show_their_tail() {
        assert_eq!(visible_tail("ana@example.org", 8), "ple.org");
        assert_eq!(visible_tail("ana", 8), "ana");
        assert_eq!(visible_tail("joão", 3), "ão");
        assert_eq!(visible_tail("", 0), "");
        assert_eq!(visible_tail("abc", 0), "");
    }

    #[test]
    fn dropdown_window_follows_selection() {
        assert_eq!(dropdown_window(28, 0, 10), 0..10);
        assert_eq!(dropdown_window(28, 15, 10), 6..16);
        assert_eq!(dropdown_window(28, 27, 10), 18..28);
        assert_eq!(dropdown_window(3, 2, 10), 0..3);
        assert_eq!(dropdown_window(3, 2, 0), 0..0);
    }

    #[test]
    fn dropdown_flips_above_near_the_bottom() {
        let screen = Rect::new(0, 0, 80, 24);
        let below = dropdown_area(Rect::new(0, 5, 20, 3), 28, screen);
        assert_eq!(below, Rect::new(0, 8, 20, 12));

        let above = dropdown_area(Rect::new(0, 18, 20, 3), 28, screen);
        assert_eq!(above, Rect::new(0, 6, 20, 12));
    }
}
