use ecoleta_core::{Choice, Coordinate, Effect, FieldUpdate, FormEvent, FormState, map::MapView};

/// Number of category tiles per grid row.
pub(crate) const ITEM_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Name,
    Email,
    Whatsapp,
    State,
    City,
    Items,
    Submit,
    Map,
}

const FOCUS_ORDER: [Focus; 8] = [
    Focus::Name,
    Focus::Email,
    Focus::Whatsapp,
    Focus::State,
    Focus::City,
    Focus::Items,
    Focus::Submit,
    Focus::Map,
];

impl Focus {
    pub(crate) fn next(self) -> Self {
        self.step(1)
    }

    pub(crate) fn prev(self) -> Self {
        self.step(FOCUS_ORDER.len() - 1)
    }

    fn step(self, offset: usize) -> Self {
        let position = FOCUS_ORDER
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0);
        FOCUS_ORDER
            .get((position + offset) % FOCUS_ORDER.len())
            .copied()
            .unwrap_or(Focus::Name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Select {
    State,
    City,
}

/// Open dropdown and its highlighted option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dropdown {
    pub select: Select,
    pub index: usize,
}

pub(crate) struct App {
    pub form: FormState,

    pub focus: Focus,
    pub dropdown: Option<Dropdown>,

    pub map_zoom: u8,
    /// Keyboard cursor on the map; `None` follows the map centre.
    pub map_cursor: Option<Coordinate>,
    pub tile_url: String,

    pub item_cursor: usize,
}

impl App {
    pub(crate) fn new(form: FormState, map_zoom: u8, tile_url: String) -> Self {
        Self {
            form,
            focus: Focus::Name,
            dropdown: None,
            map_zoom,
            map_cursor: None,
            tile_url,
            item_cursor: 0,
        }
    }

    /// Feed `event` to the form and keep view state consistent with the result.
    pub(crate) fn apply(&mut self, event: FormEvent) -> Vec<Effect> {
        let effects = self.form.update(event);
        self.item_cursor = self
            .item_cursor
            .min(self.form.catalog().len().saturating_sub(1));
        if let Some(dropdown) = self.dropdown.as_mut() {
            let len = match dropdown.select {
                Select::State => self.form.state_options().len(),
                Select::City => self.form.city_options().len(),
            };
            dropdown.index = dropdown.index.min(len.saturating_sub(1));
        }
        effects
    }

    pub(crate) fn map_view(&self) -> MapView {
        MapView::new(self.form.center(), self.map_zoom)
    }

    pub(crate) fn cursor(&self) -> Coordinate {
        self.map_cursor.unwrap_or_else(|| self.form.center())
    }

    /// Move the map cursor by whole steps of one 32nd of the visible span.
    pub(crate) fn move_cursor(&mut self, north: i8, east: i8) {
        let view = self.map_view();
        let cursor = self.cursor();
        let [west, east_edge] = view.x_bounds();
        let [south, north_edge] = view.y_bounds();
        let latitude = cursor.latitude + f64::from(north) * view.latitude_span() / 32.0;
        let longitude = cursor.longitude + f64::from(east) * view.longitude_span() / 32.0;
        self.map_cursor = Some(Coordinate::new(
            latitude.clamp(south, north_edge),
            longitude.clamp(west, east_edge),
        ));
    }

    pub(crate) fn zoom_in(&mut self) {
        self.map_zoom = self.map_view().zoomed_in().zoom;
        self.map_cursor = None;
    }

    pub(crate) fn zoom_out(&mut self) {
        self.map_zoom = self.map_view().zoomed_out().zoom;
        self.map_cursor = None;
    }

    pub(crate) fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.dropdown = None;
    }

    /// Current value of a text field, `None` for non-text focus targets.
    pub(crate) fn text_value(&self, focus: Focus) -> Option<&str> {
        let draft = self.form.draft();
        match focus {
            Focus::Name => Some(&draft.name),
            Focus::Email => Some(&draft.email),
            Focus::Whatsapp => Some(&draft.whatsapp),
            Focus::State | Focus::City | Focus::Items | Focus::Submit | Focus::Map => None,
        }
    }

    /// Edit the focused text field, producing the overwrite event.
    pub(crate) fn edit_text(&self, edit: impl FnOnce(&mut String)) -> Option<FormEvent> {
        let mut value = self.text_value(self.focus)?.to_owned();
        edit(&mut value);
        let update = match self.focus {
            Focus::Name => FieldUpdate::SetName(value),
            Focus::Email => FieldUpdate::SetEmail(value),
            Focus::Whatsapp => FieldUpdate::SetWhatsapp(value),
            Focus::State | Focus::City | Focus::Items | Focus::Submit | Focus::Map => return None,
        };
        Some(FormEvent::Field(update))
    }

    pub(crate) fn option_labels(&self, select: Select) -> Vec<String> {
        match select {
            Select::State => labels(self.form.state_options()),
            Select::City => labels(self.form.city_options()),
        }
    }

    pub(crate) fn open_dropdown(&mut self, select: Select) {
        let index = match select {
            Select::State => self.form.selected_state_index(),
            Select::City => self.form.selected_city_index(),
        };
        self.dropdown = Some(Dropdown { select, index });
    }

    pub(crate) fn move_dropdown(&mut self, delta: isize) {
        let Some(dropdown) = self.dropdown else {
            return;
        };
        let len = self.option_labels(dropdown.select).len();
        let index = dropdown
            .index
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
        self.dropdown = Some(Dropdown { index, ..dropdown });
    }

    /// Close the dropdown and emit the selection for its highlighted option.
    pub(crate) fn commit_dropdown(&mut self) -> Option<FormEvent> {
        let dropdown = self.dropdown.take()?;
        let update = match dropdown.select {
            Select::State => {
                let choice = self.form.state_options().into_iter().nth(dropdown.index)?;
                FieldUpdate::SetStateCode(choice.value)
            }
            Select::City => {
                let choice = self.form.city_options().into_iter().nth(dropdown.index)?;
                FieldUpdate::SetCityName(choice.value)
            }
        };
        Some(FormEvent::Field(update))
    }

    /// Move the grid cursor by rows and columns, staying inside the catalog.
    pub(crate) fn move_item_cursor(&mut self, rows: isize, columns: isize) {
        let len = self.form.catalog().len();
        if len == 0 {
            return;
        }
        let width = isize::try_from(ITEM_COLUMNS).unwrap_or(1);
        let delta = rows * width + columns;
        self.item_cursor = self
            .item_cursor
            .saturating_add_signed(delta)
            .min(len - 1);
    }

    pub(crate) fn toggle_current_item(&self) -> Option<FormEvent> {
        self.form
            .catalog()
            .get(self.item_cursor)
            .map(|category| FormEvent::ItemToggled(category.id))
    }
}

fn labels<T>(choices: Vec<Choice<T>>) -> Vec<String> {
    choices.into_iter().map(|choice| choice.label).collect()
}

#[cfg(test)]
mod tests {
    use ecoleta_core::{Category, CategoryId, CityName, FormOptions, RequestTicket, StateCode};
    use pretty_assertions::assert_eq;

    use super::*;

    fn app() -> App {
        App::new(FormState::new(FormOptions::default()), 4, String::new())
    }

    fn catalog(count: u32) -> Vec<Category> {
        (1..=count)
            .map(|id| Category {
                id: CategoryId(id),
                name: format!("Item {id}"),
                icon_url: format!("{id}.svg"),
            })
            .collect()
    }

    #[test]
    fn focus_wraps_around() {
        assert_eq!(Focus::Name.prev(), Focus::Map);
        assert_eq!(Focus::Map.next(), Focus::Name);
        assert_eq!(Focus::Whatsapp.next(), Focus::State);
    }

    #[test]
    fn typing_overwrites_the_focused_field() {
        let mut app = app();
        app.focus = Focus::Email;
        for ch in "ana@".chars() {
            let event = app.edit_text(|value| value.push(ch));
            app.apply(event.expect("email is a text field"));
        }
        let event = app.edit_text(|value| {
            value.pop();
        });
        app.apply(event.expect("email is a text field"));
        assert_eq!(app.form.draft().email, "ana");

        app.focus = Focus::Map;
        assert!(app.edit_text(|value| value.push('x')).is_none());
    }

    #[test]
    fn state_dropdown_commit_requests_cities() {
        let mut app = app();
        app.apply(FormEvent::StatesLoaded(Ok(vec![
            StateCode::from("AC"),
            StateCode::from("SP"),
        ])));
        app.open_dropdown(Select::State);
        assert_eq!(app.dropdown.map(|dropdown| dropdown.index), Some(0));

        app.move_dropdown(2);
        let event = app.commit_dropdown().expect("an option is highlighted");
        let effects = app.apply(event);

        assert_eq!(app.dropdown, None);
        assert_eq!(app.form.draft().state, Some(StateCode::from("SP")));
        assert_eq!(
            effects,
            vec![Effect::FetchCities {
                ticket: RequestTicket(1),
                state: StateCode::from("SP"),
            }]
        );
    }

    #[test]
    fn city_dropdown_lists_placeholder_then_cities() {
        let mut app = app();
        let effects = app.apply(FormEvent::Field(FieldUpdate::SetStateCode(Some(
            StateCode::from("SP"),
        ))));
        let Some(Effect::FetchCities { ticket, .. }) = effects.into_iter().next() else {
            panic!("state change should fetch cities");
        };
        app.apply(FormEvent::CitiesLoaded {
            ticket,
            result: Ok(vec![CityName::from("Campinas"), CityName::from("Santos")]),
        });

        assert_eq!(
            app.option_labels(Select::City),
            vec!["Select a city", "Campinas", "Santos"]
        );
    }

    #[test]
    fn dropdown_index_stays_in_range() {
        let mut app = app();
        app.open_dropdown(Select::City);
        app.move_dropdown(5);
        app.move_dropdown(-9);
        assert_eq!(app.dropdown.map(|dropdown| dropdown.index), Some(0));
        let event = app.commit_dropdown();
        assert!(matches!(
            event,
            Some(FormEvent::Field(FieldUpdate::SetCityName(None)))
        ));
    }

    #[test]
    fn grid_cursor_moves_by_rows_and_toggles() {
        let mut app = app();
        app.apply(FormEvent::CatalogLoaded(Ok(catalog(6))));
        app.move_item_cursor(1, 1);
        assert_eq!(app.item_cursor, 4);
        app.move_item_cursor(5, 0);
        assert_eq!(app.item_cursor, 5);

        let event = app.toggle_current_item().expect("cursor is on a tile");
        app.apply(event);
        assert!(app.form.is_selected(CategoryId(6)));
    }

    #[test]
    fn map_cursor_stays_inside_the_view() {
        let mut app = app();
        for _ in 0..200 {
            app.move_cursor(1, -1);
        }
        assert!(app.map_view().contains(app.cursor()));
        app.zoom_in();
        assert_eq!(app.map_zoom, 5);
        assert_eq!(app.map_cursor, None);
    }
}
