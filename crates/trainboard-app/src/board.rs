// SPDX-License-Identifier: AGPL-3.0
// Trainboard - Home board loop
//
// Polls the active favorites, redraws whenever the favorites or the
// schedules change and runs console commands until stdin closes or the
// process is interrupted.

use crate::commands::{Command, HELP};
use crate::render;
use crate::state::AppState;
use chrono::{Local, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use trainboard_core::presentation::{
    best_location, nearby_board, nearby_query, route_arrivals, Coordinates, HomeView,
    LocationPermission, RouteEnablementEditor,
};
use trainboard_core::{
    AppError, AppStatus, FavoritePatch, HttpScheduleClient, PollHandle, ScheduleQuery,
    StationSchedule, StationSearch,
};

pub struct HomeBoard {
    state: AppState,
    handle: PollHandle,
    search: StationSearch<HttpScheduleClient>,
    active_ids: Vec<String>,
    last_location: Option<Coordinates>,
}

impl HomeBoard {
    /// Load favorites and start polling the active ones
    pub async fn start(state: AppState) -> Self {
        state.favorites.initialize().await;
        let active_ids = state.favorites.active_ids();
        let handle = state
            .poller
            .subscribe(ScheduleQuery::Stations(active_ids.clone()));
        let search = StationSearch::new(state.client.clone(), state.settings.search_debounce());

        Self {
            state,
            handle,
            search,
            active_ids,
            last_location: None,
        }
    }

    pub async fn run(mut self) -> Result<(), AppError> {
        let mut favorites_rx = self.state.favorites.subscribe();
        let mut query_rx = self.handle.watch();
        let mut search_rx = self.search.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("Type \"help\" for commands.");
        self.draw();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = favorites_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if self.resubscribe() {
                        query_rx = self.handle.watch();
                    }
                    self.draw();
                }
                changed = query_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.draw();
                }
                changed = search_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.show_search();
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match Command::parse(&line) {
                        Ok(Some(command)) => match self.execute(command).await {
                            Ok(true) => {}
                            Ok(false) => break,
                            Err(e) => println!("! {}", e),
                        },
                        Ok(None) => {}
                        Err(message) => println!("! {}", message),
                    }
                }
            }
        }

        tracing::info!("Shutting down");
        self.state.query_cache.clear();
        Ok(())
    }

    /// Poll the new set of active favorites if it changed
    fn resubscribe(&mut self) -> bool {
        let ids = self.state.favorites.active_ids();
        if ids == self.active_ids {
            return false;
        }
        tracing::debug!("Active favorites changed: {:?}", ids);
        self.state
            .poller
            .resubscribe(&mut self.handle, ScheduleQuery::Stations(ids.clone()));
        self.active_ids = ids;
        true
    }

    fn draw(&self) {
        let view = HomeView::new(
            &self.state.favorites.snapshot(),
            &self.handle.state(),
            self.state.settings.enablement_default,
        );
        print!("{}", render::home(&view, Utc::now(), &Local));
    }

    fn show_search(&self) {
        let state = self.search.state();
        if state.is_loading {
            println!("Searching...");
        } else if let Some(error) = &state.error {
            println!("! {}", error);
        } else if !state.query.is_empty() {
            print!("{}", render::search_results(&state.query, &state.results));
        }
    }

    /// Schedule of a station from the current board, fetched if not on it
    async fn schedule(&self, id: &str) -> Result<StationSchedule, AppError> {
        let polled = self
            .handle
            .state()
            .data
            .and_then(|stations| stations.into_iter().find(|s| s.id == id));
        match polled {
            Some(station) => Ok(station),
            None => ScheduleQuery::Station(id.to_string())
                .run(&*self.state.client)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| AppError::NotFound(format!("Station {} not found", id))),
        }
    }

    /// Run one command; `false` ends the loop
    async fn execute(&mut self, command: Command) -> Result<bool, AppError> {
        let favorites = &self.state.favorites;
        match command {
            Command::Refresh => self.handle.refresh(),
            Command::Search(text) => self.search.input(&text),
            Command::Add(id) => {
                let station = self
                    .search
                    .state()
                    .results
                    .into_iter()
                    .find(|s| s.id == id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("{} is not in the last search results", id))
                    })?;
                if !favorites.add_station(&station).await? {
                    println!("{} is already a favorite", station.name);
                }
            }
            Command::Remove(id) => {
                if !favorites.contains(&id) {
                    return Err(AppError::NotFound(format!("{} is not a favorite", id)));
                }
                favorites.remove_station(&id).await?;
            }
            Command::Move { from, to } => {
                let count = favorites.favorites().len();
                if from >= count || to >= count {
                    return Err(AppError::NotFound(format!(
                        "There are only {} favorites",
                        count
                    )));
                }
                favorites.move_station(from, to).await?;
            }
            Command::Activate(id) => {
                let favorite = favorites
                    .get(&id)
                    .ok_or_else(|| AppError::NotFound(format!("{} is not a favorite", id)))?;
                favorites
                    .update(&id, FavoritePatch::active(!favorite.is_active()))
                    .await?;
            }
            Command::Route {
                station,
                direction,
                route,
            } => {
                let schedule = self.schedule(&station).await?;
                let times = route_arrivals(&schedule, direction, &route);
                println!("({}) {} {}", route, schedule.name, direction);
                if times.is_empty() {
                    println!("   No trains found");
                } else {
                    print!("{}", render::rows(&times, Utc::now(), &Local));
                }
            }
            Command::Toggle {
                station,
                direction,
                route,
            } => {
                let favorite = favorites
                    .get(&station)
                    .ok_or_else(|| AppError::NotFound(format!("{} is not a favorite", station)))?;
                let routes = match self.schedule(&station).await {
                    Ok(schedule) => schedule.routes,
                    Err(e) => {
                        tracing::debug!("Using stored routes for {}: {}", station, e);
                        favorite.routes.clone().unwrap_or_default()
                    }
                };
                let mut editor = RouteEnablementEditor::new(
                    &favorite,
                    &routes,
                    self.state.settings.enablement_default,
                );
                let shown = editor.toggle(&**favorites, direction, &route).await?;
                println!(
                    "({}) {} on {}: {}",
                    route,
                    direction,
                    favorite.name,
                    if shown { "shown" } else { "hidden" }
                );
            }
            Command::Nearby(position) => {
                let location = best_location(position, self.last_location);
                self.last_location = location;
                match nearby_query(
                    LocationPermission::Granted,
                    location,
                    self.state.settings.nearby_limit,
                )? {
                    Some(query) => {
                        let stations = query.run(&*self.state.client).await?;
                        for station in nearby_board(&stations) {
                            print!("{}", render::board(&station, Utc::now(), &Local));
                        }
                    }
                    None => println!("No position yet; use nearby <lat> <lon>"),
                }
            }
            Command::RoutesDefault(default) => {
                let mut stored = self.state.settings_store.get();
                stored.enablement_default = default;
                self.state.settings_store.update(stored)?;
                self.state.settings.enablement_default = default;
                self.draw();
            }
            Command::Online(online) => self.state.online.set_online(online),
            Command::Foreground(active) => self.state.focus.set_status(if active {
                AppStatus::Active
            } else {
                AppStatus::Background
            }),
            Command::Reset => favorites.clear().await?,
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}
