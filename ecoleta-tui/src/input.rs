use crossterm::event::{
    Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ecoleta_core::{FieldUpdate, FormEvent};
use ratatui::layout::{Position, Rect};

use crate::app::{App, Focus, Select};
use crate::ui;

#[derive(Debug)]
pub(crate) enum Action {
    None,
    Quit,
    /// Hand the event to the form controller
    Dispatch(FormEvent),
}

impl From<Option<FormEvent>> for Action {
    fn from(event: Option<FormEvent>) -> Self {
        event.map_or(Action::None, Action::Dispatch)
    }
}

pub(crate) fn handle_event(event: CEvent, app: &mut App, screen: Rect) -> Action {
    match event {
        CEvent::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(key, app),
        CEvent::Mouse(mouse) => handle_mouse_event(mouse, app, screen),
        _ => Action::None,
    }
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Delete, Down, Enter, Esc, Left, Right, Tab, Up};

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global shortcuts
    match key.code {
        Char('c' | 'q') if ctrl => return Action::Quit,
        Char('s') if ctrl => {
            app.dropdown = None;
            return Action::Dispatch(FormEvent::Submitted);
        }
        Tab => {
            app.set_focus(app.focus.next());
            return Action::None;
        }
        BackTab => {
            app.set_focus(app.focus.prev());
            return Action::None;
        }
        _ => {}
    }

    if app.dropdown.is_some() {
        match key.code {
            Up => app.move_dropdown(-1),
            Down => app.move_dropdown(1),
            KeyCode::PageUp => app.move_dropdown(-10),
            KeyCode::PageDown => app.move_dropdown(10),
            Enter | Char(' ') => return app.commit_dropdown().into(),
            Esc => app.dropdown = None,
            _ => {}
        }
        return Action::None;
    }

    if key.code == Esc {
        app.form.clear_notice();
        return Action::None;
    }

    match app.focus {
        Focus::Name | Focus::Email | Focus::Whatsapp => match key.code {
            Char(character) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                app.edit_text(|value| value.push(character)).into()
            }
            Backspace => app
                .edit_text(|value| {
                    value.pop();
                })
                .into(),
            Enter | Down => {
                app.set_focus(app.focus.next());
                Action::None
            }
            Up => {
                app.set_focus(app.focus.prev());
                Action::None
            }
            _ => Action::None,
        },

        Focus::State | Focus::City => {
            let select = if app.focus == Focus::State {
                Select::State
            } else {
                Select::City
            };
            match key.code {
                Enter | Char(' ') | Down => {
                    app.open_dropdown(select);
                    Action::None
                }
                Backspace | Delete => Action::Dispatch(FormEvent::Field(match select {
                    Select::State => FieldUpdate::SetStateCode(None),
                    Select::City => FieldUpdate::SetCityName(None),
                })),
                _ => Action::None,
            }
        }

        Focus::Items => match key.code {
            Up => {
                app.move_item_cursor(-1, 0);
                Action::None
            }
            Down => {
                app.move_item_cursor(1, 0);
                Action::None
            }
            Left => {
                app.move_item_cursor(0, -1);
                Action::None
            }
            Right => {
                app.move_item_cursor(0, 1);
                Action::None
            }
            Enter | Char(' ') => app.toggle_current_item().into(),
            _ => Action::None,
        },

        Focus::Submit => match key.code {
            Enter | Char(' ') => Action::Dispatch(FormEvent::Submitted),
            _ => Action::None,
        },

        Focus::Map => match key.code {
            Up => {
                app.move_cursor(1, 0);
                Action::None
            }
            Down => {
                app.move_cursor(-1, 0);
                Action::None
            }
            Left => {
                app.move_cursor(0, -1);
                Action::None
            }
            Right => {
                app.move_cursor(0, 1);
                Action::None
            }
            Char('+' | '=') => {
                app.zoom_in();
                Action::None
            }
            Char('-') => {
                app.zoom_out();
                Action::None
            }
            Char('c') => {
                app.map_cursor = None;
                Action::None
            }
            Enter | Char(' ') => Action::Dispatch(FormEvent::MapClicked(app.cursor())),
            _ => Action::None,
        },
    }
}

pub(crate) fn handle_mouse_event(mouse: MouseEvent, app: &mut App, screen: Rect) -> Action {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return Action::None;
    }
    let point = Position::new(mouse.column, mouse.row);
    let areas = ui::layout(screen);

    // An open dropdown takes the click, or closes when clicked outside
    if let Some(dropdown) = app.dropdown {
        let len = app.option_labels(dropdown.select).len();
        let popup = ui::dropdown_area(areas.select(dropdown.select), len, screen);
        let inner = popup.inner(ratatui::layout::Margin::new(1, 1));
        if inner.contains(point) {
            let visible = usize::from(inner.height);
            let window = ui::dropdown_window(len, dropdown.index, visible);
            let index = window.start + usize::from(point.y - inner.y);
            if index < window.end {
                app.dropdown = Some(crate::app::Dropdown { index, ..dropdown });
                return app.commit_dropdown().into();
            }
            return Action::None;
        }
        if popup.contains(point) {
            return Action::None;
        }
        app.dropdown = None;
    }

    let text_fields = [
        (areas.name, Focus::Name),
        (areas.email, Focus::Email),
        (areas.whatsapp, Focus::Whatsapp),
    ];
    if let Some((_, focus)) = text_fields.iter().find(|(area, _)| area.contains(point)) {
        app.set_focus(*focus);
        return Action::None;
    }

    for (select, focus) in [(Select::State, Focus::State), (Select::City, Focus::City)] {
        if areas.select(select).contains(point) {
            app.set_focus(focus);
            app.open_dropdown(select);
            return Action::None;
        }
    }

    let canvas = ui::map_canvas(areas.map);
    if canvas.contains(point) {
        app.set_focus(Focus::Map);
        let picked = app.map_view().coordinate_at(
            point.x - canvas.x,
            point.y - canvas.y,
            canvas.width,
            canvas.height,
        );
        if let Some(position) = picked {
            app.map_cursor = Some(position);
            return Action::Dispatch(FormEvent::MapClicked(position));
        }
        return Action::None;
    }

    if areas.items.contains(point) {
        app.set_focus(Focus::Items);
        let (window, tiles) =
            ui::item_layout(areas.items, app.form.catalog().len(), app.item_cursor);
        if let Some(offset) = tiles.iter().position(|tile| tile.contains(point)) {
            app.item_cursor = window.start + offset;
            return app.toggle_current_item().into();
        }
        return Action::None;
    }

    if areas.submit.contains(point) {
        app.set_focus(Focus::Submit);
        return Action::Dispatch(FormEvent::Submitted);
    }

    Action::None
}
