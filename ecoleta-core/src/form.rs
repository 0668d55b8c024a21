//! Form state controller: owns the draft and all fetched reference data.
//!
//! [`FormState::update`] is the only writer. It applies one [`FormEvent`] and
//! returns the [`Effect`]s the caller has to run; each effect eventually comes
//! back as another event. Cities requests carry a [`RequestTicket`] so a
//! response for a state the user already left is dropped instead of applied.

use crate::model::{Category, CategoryId, CityName, CollectionPoint, Coordinate, StateCode};
use crate::ports::PortError;

/// Label of the leading “nothing selected” state option.
pub const STATE_PLACEHOLDER: &str = "Select a state (UF)";
/// Label of the leading “nothing selected” city option.
pub const CITY_PLACEHOLDER: &str = "Select a city";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Edit of a single draft field.
pub enum FieldUpdate {
    /// Entity name.
    SetName(String),
    /// Contact e-mail.
    SetEmail(String),
    /// Contact WhatsApp number.
    SetWhatsapp(String),
    /// State selection; `None` picks the placeholder.
    SetStateCode(Option<StateCode>),
    /// City selection; `None` picks the placeholder.
    SetCityName(Option<CityName>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Sequence number of a cities request.
pub struct RequestTicket(pub u64);

#[derive(Debug)]
/// Everything that can happen to the form.
pub enum FormEvent {
    /// The form was opened.
    Mounted,
    /// Device geolocation finished.
    Located(Result<Coordinate, PortError>),
    /// Items catalog request finished.
    CatalogLoaded(Result<Vec<Category>, PortError>),
    /// State list request finished.
    StatesLoaded(Result<Vec<StateCode>, PortError>),
    /// Cities request finished.
    CitiesLoaded {
        /// Ticket issued with the matching [`Effect::FetchCities`].
        ticket: RequestTicket,
        /// Response payload.
        result: Result<Vec<CityName>, PortError>,
    },
    /// User edited a field.
    Field(FieldUpdate),
    /// User clicked the map.
    MapClicked(Coordinate),
    /// User clicked a category tile.
    ItemToggled(CategoryId),
    /// User pressed the submit button.
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side effect requested by the controller.
pub enum Effect {
    /// Ask the geolocation port for the device position.
    Locate,
    /// Load the items catalog.
    FetchCatalog,
    /// Load the state list.
    FetchStates,
    /// Load the cities of `state`.
    FetchCities {
        /// Ticket to echo back in [`FormEvent::CitiesLoaded`].
        ticket: RequestTicket,
        /// State whose cities are requested.
        state: StateCode,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Product switches for the controller.
pub struct FormOptions {
    /// Clear the selected city whenever the state changes.
    pub reset_city_on_state_change: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            reset_city_on_state_change: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Dropdown entry; `value` is `None` for the placeholder.
pub struct Choice<T> {
    /// Selected value.
    pub value: Option<T>,
    /// Visible text.
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Remote data the form waits for.
pub enum Pending {
    /// Geolocation.
    Location,
    /// Items catalog.
    Catalog,
    /// State list.
    States,
    /// City list.
    Cities,
}

#[derive(Debug, Clone, Default)]
/// Complete state of the registration form.
pub struct FormState {
    draft: CollectionPoint,
    center: Coordinate,
    located: bool,
    catalog: Vec<Category>,
    states: Vec<StateCode>,
    cities: Vec<CityName>,
    cities_ticket: Option<RequestTicket>,
    issued: u64,
    pending: Vec<Pending>,
    notice: Option<String>,
    options: FormOptions,
}

impl FormState {
    /// Empty form with the given options.
    #[must_use]
    pub fn new(options: FormOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Apply `event` and return the effects it triggers.
    pub fn update(&mut self, event: FormEvent) -> Vec<Effect> {
        match event {
            FormEvent::Mounted => {
                self.pending = vec![Pending::Location, Pending::Catalog, Pending::States];
                vec![Effect::Locate, Effect::FetchCatalog, Effect::FetchStates]
            }
            FormEvent::Located(result) => {
                self.settle(Pending::Location);
                self.apply_location(result);
                Vec::new()
            }
            FormEvent::CatalogLoaded(result) => {
                self.settle(Pending::Catalog);
                match result {
                    Ok(catalog) => {
                        tracing::debug!(count = catalog.len(), "catalog loaded");
                        self.catalog = catalog;
                    }
                    Err(err) => self.report("Could not load collection items", &err),
                }
                Vec::new()
            }
            FormEvent::StatesLoaded(result) => {
                self.settle(Pending::States);
                match result {
                    Ok(states) => {
                        tracing::debug!(count = states.len(), "states loaded");
                        self.states = states;
                    }
                    Err(err) => self.report("Could not load states", &err),
                }
                Vec::new()
            }
            FormEvent::CitiesLoaded { ticket, result } => {
                self.apply_cities(ticket, result);
                Vec::new()
            }
            FormEvent::Field(update) => self.apply_field(update),
            FormEvent::MapClicked(position) => {
                self.draft.position = position;
                Vec::new()
            }
            FormEvent::ItemToggled(id) => {
                let selected = self.draft.toggle_item(id);
                tracing::debug!(%id, selected, "category toggled");
                Vec::new()
            }
            FormEvent::Submitted => {
                match self.draft_json() {
                    Ok(draft) => tracing::info!(%draft, "submit intercepted; nothing is sent"),
                    Err(err) => tracing::error!(error = %err, "draft could not be serialized"),
                }
                self.notice = Some("Registration is not sent anywhere yet".to_owned());
                Vec::new()
            }
        }
    }

    fn apply_location(&mut self, result: Result<Coordinate, PortError>) {
        match result {
            Ok(position) if !self.located => {
                tracing::info!(%position, "map centred on device location");
                self.center = position;
                self.located = true;
            }
            Ok(position) => {
                tracing::debug!(%position, "ignoring repeated location");
            }
            Err(err) => {
                tracing::warn!(error = %err, "geolocation failed; map stays at origin");
            }
        }
    }

    fn apply_cities(&mut self, ticket: RequestTicket, result: Result<Vec<CityName>, PortError>) {
        if self.cities_ticket != Some(ticket) {
            tracing::debug!(ticket = ticket.0, "dropping stale cities response");
            return;
        }
        self.cities_ticket = None;
        self.settle(Pending::Cities);
        match result {
            Ok(cities) => {
                tracing::debug!(count = cities.len(), "cities loaded");
                self.cities = cities;
            }
            Err(err) => self.report("Could not load cities", &err),
        }
    }

    fn apply_field(&mut self, update: FieldUpdate) -> Vec<Effect> {
        match update {
            FieldUpdate::SetName(name) => self.draft.name = name,
            FieldUpdate::SetEmail(email) => self.draft.email = email,
            FieldUpdate::SetWhatsapp(whatsapp) => self.draft.whatsapp = whatsapp,
            FieldUpdate::SetCityName(city) => self.draft.city = city,
            FieldUpdate::SetStateCode(state) => return self.select_state(state),
        }
        Vec::new()
    }

    fn select_state(&mut self, state: Option<StateCode>) -> Vec<Effect> {
        if self.draft.state == state {
            return Vec::new();
        }
        self.draft.state.clone_from(&state);
        self.cities.clear();
        if self.options.reset_city_on_state_change {
            self.draft.city = None;
        }

        let Some(state) = state else {
            self.cities_ticket = None;
            self.settle(Pending::Cities);
            return Vec::new();
        };

        self.issued += 1;
        let ticket = RequestTicket(self.issued);
        self.cities_ticket = Some(ticket);
        if !self.pending.contains(&Pending::Cities) {
            self.pending.push(Pending::Cities);
        }
        vec![Effect::FetchCities { ticket, state }]
    }

    fn settle(&mut self, done: Pending) {
        self.pending.retain(|pending| *pending != done);
    }

    fn report(&mut self, context: &str, err: &PortError) {
        tracing::error!(error = %err, "{context}");
        self.notice = Some(format!("{context}: {err}"));
    }

    /// Current draft.
    #[must_use]
    pub fn draft(&self) -> &CollectionPoint {
        &self.draft
    }

    /// Draft as the JSON body a registration request would carry.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn draft_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.draft)
    }

    /// Map centre, origin until geolocation succeeds.
    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Marker position picked by the user.
    #[must_use]
    pub fn marker(&self) -> Coordinate {
        self.draft.position
    }

    /// Loaded categories.
    #[must_use]
    pub fn catalog(&self) -> &[Category] {
        &self.catalog
    }

    /// Loaded state codes.
    #[must_use]
    pub fn states(&self) -> &[StateCode] {
        &self.states
    }

    /// Cities of the selected state.
    #[must_use]
    pub fn cities(&self) -> &[CityName] {
        &self.cities
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: CategoryId) -> bool {
        self.draft.items.contains(&id)
    }

    /// Requests still in flight.
    #[must_use]
    pub fn pending(&self) -> &[Pending] {
        &self.pending
    }

    /// Last error or info message for the user.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Forget the current notice.
    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// State dropdown entries, placeholder first.
    #[must_use]
    pub fn state_options(&self) -> Vec<Choice<StateCode>> {
        choices(STATE_PLACEHOLDER, &self.states, |state| state.to_string())
    }

    /// City dropdown entries, placeholder first.
    #[must_use]
    pub fn city_options(&self) -> Vec<Choice<CityName>> {
        choices(CITY_PLACEHOLDER, &self.cities, |city| city.to_string())
    }

    /// Index into [`Self::state_options`] of the selected state.
    #[must_use]
    pub fn selected_state_index(&self) -> usize {
        selected_index(&self.states, self.draft.state.as_ref())
    }

    /// Index into [`Self::city_options`] of the selected city.
    #[must_use]
    pub fn selected_city_index(&self) -> usize {
        selected_index(&self.cities, self.draft.city.as_ref())
    }
}

fn choices<T: Clone>(placeholder: &str, values: &[T], label: impl Fn(&T) -> String) -> Vec<Choice<T>> {
    std::iter::once(Choice {
        value: None,
        label: placeholder.to_owned(),
    })
    .chain(values.iter().map(|value| Choice {
        value: Some(value.clone()),
        label: label(value),
    }))
    .collect()
}

fn selected_index<T: PartialEq>(values: &[T], selected: Option<&T>) -> usize {
    selected
        .and_then(|selected| values.iter().position(|value| value == selected))
        .map_or(0, |position| position + 1)
}
