use std::error::Error;
use std::io;
use std::path::Path;
use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, NaiveDate};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Map as WorldMap, MapResolution, Points};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::backend::PlanBackend;
use crate::builder::Builder;
use crate::domain::{Itinerary, TripDetails};
use crate::map::MapView;
use crate::provider::PlaceProvider;
use crate::route::format_distance;
use crate::search::SearchPhase;
use crate::storage::save_draft;

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const MARKER_COLOR: Color = Color::LightRed;
const ROUTE_COLOR: Color = Color::LightBlue;
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// Collaborators the builder screen talks to besides the builder itself.
pub struct BuilderContext<'a> {
	pub provider: &'a dyn PlaceProvider,
	pub backend: &'a dyn PlanBackend,
	pub draft_path: &'a Path,
}

pub fn run_builder(builder: &mut Builder<MapView>, ctx: &BuilderContext<'_>) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, builder, ctx);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	builder: &mut Builder<MapView>,
	ctx: &BuilderContext<'_>,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::default();
	if !builder.itinerary().details_complete() {
		app.status = "Set a title (t) and dates (D) to start placing locations".to_string();
	}

	loop {
		builder.tick(Instant::now());
		app.clamp_selection(builder);
		terminal.draw(|frame| draw_builder(frame, &app, builder))?;

		if event::poll(POLL_INTERVAL)? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, builder, ctx),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, builder, ctx),
					InputMode::Normal => handle_normal_key(&mut app, key.code, builder, ctx),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_builder(frame: &mut Frame, app: &App, builder: &Builder<MapView>) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(12), Constraint::Length(5)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage(24),
			Constraint::Percentage(32),
			Constraint::Percentage(44),
		])
		.split(layout[0]);

	render_days_panel(frame, body[0], app, builder.itinerary());
	render_places_panel(frame, body[1], app, builder);
	render_map_panel(frame, body[2], app, builder.map(), builder.render_pending());
	render_footer(frame, layout[1], app);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_days_panel(frame: &mut Frame, area: Rect, app: &App, itinerary: &Itinerary) {
	let details = itinerary.details();
	let title = if details.title.trim().is_empty() {
		"(untitled trip)".to_string()
	} else {
		details.title.clone()
	};

	let items = itinerary
		.days()
		.iter()
		.map(|bucket| {
			let date = day_date(details, bucket.day())
				.map(|date| date.format(" %a %d %b").to_string())
				.unwrap_or_default();
			let count = bucket.places().len();
			let style = if bucket.day() == itinerary.active_day() {
				Style::default().fg(Color::Yellow)
			} else {
				Style::default()
			};
			ListItem::new(Line::from(vec![
				Span::styled(format!("Day {}", bucket.day()), style),
				Span::styled(date, Style::default().fg(Color::DarkGray)),
				Span::raw(format!("  {count} {}", if count == 1 { "place" } else { "places" })),
			]))
		})
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !items.is_empty() {
		state.select(Some(itinerary.active_day().saturating_sub(1) as usize));
	}

	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(set trip dates with D)")]
	} else {
		items
	})
	.block(
		Block::default()
			.borders(Borders::ALL)
			.title(format!("{title} | {} pax", details.participants))
			.border_style(border_style(app.focus == FocusPane::Days)),
	)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_places_panel(frame: &mut Frame, area: Rect, app: &App, builder: &Builder<MapView>) {
	let itinerary = builder.itinerary();
	let places = itinerary
		.active_bucket()
		.map(|bucket| bucket.places())
		.unwrap_or_default();
	let legs = itinerary.route().leg_distances_km();

	let items = places
		.iter()
		.enumerate()
		.map(|(index, place)| {
			let mut heading = vec![
				Span::styled(format!("{}. ", index + 1), Style::default().fg(MARKER_COLOR)),
				Span::raw(place.name().to_string()),
			];
			if let Some(rating) = place.rating() {
				heading.push(Span::styled(format!(" *{rating:.1}"), Style::default().fg(Color::Yellow)));
			}
			if let Some(leg) = index.checked_sub(1).and_then(|leg| legs.get(leg)) {
				heading.push(Span::styled(
					format!(" +{}", format_distance(*leg)),
					Style::default().fg(ROUTE_COLOR),
				));
			}
			if builder.edit().is_editing(place.id()) {
				heading.push(Span::styled(" (editing)", Style::default().fg(Color::Yellow)));
			}

			ListItem::new(vec![
				Line::from(heading),
				Line::from(Span::styled(
					format!("   {}", place.address()),
					Style::default().fg(Color::DarkGray),
				)),
			])
		})
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !items.is_empty() {
		state.select(Some(app.place_index.min(items.len() - 1)));
	}

	let title = format!(
		"Day {} | {} places | {}",
		itinerary.active_day(),
		places.len(),
		format_distance(itinerary.route().total_km())
	);
	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no places yet: / to search, m to drop a pin)")]
	} else {
		items
	})
	.block(
		Block::default()
			.borders(Borders::ALL)
			.title(title)
			.border_style(border_style(app.focus == FocusPane::Places)),
	)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_map_panel(frame: &mut Frame, area: Rect, app: &App, map: &MapView, routing: bool) {
	let (x_bounds, y_bounds) = map.bounds();
	let center = map.center();
	let mut title = format!("Map | zoom {} | {:.4}, {:.4}", map.zoom(), center.lat, center.lng);
	if routing {
		title.push_str(" | routing");
	}

	let canvas = Canvas::default()
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(app.focus == FocusPane::Map)),
		)
		.marker(symbols::Marker::Braille)
		.x_bounds(x_bounds)
		.y_bounds(y_bounds)
		.paint(|ctx| {
			ctx.draw(&WorldMap {
				resolution: MapResolution::High,
				color: Color::DarkGray,
			});
			ctx.layer();

			let path = map.path();
			for leg in path.points().windows(2) {
				ctx.draw(&CanvasLine::new(leg[0].lng, leg[0].lat, leg[1].lng, leg[1].lat, ROUTE_COLOR));
			}
			let waypoints = path
				.waypoints()
				.iter()
				.map(|point| (point.lng, point.lat))
				.collect::<Vec<_>>();
			ctx.draw(&Points {
				coords: &waypoints,
				color: ROUTE_COLOR,
			});
			if let (Some(origin), Some(destination)) = (path.origin(), path.destination()) {
				ctx.print(origin.lng, origin.lat, Span::styled("S", Style::default().fg(Color::Green)));
				ctx.print(destination.lng, destination.lat, Span::styled("E", Style::default().fg(Color::Green)));
			}

			let coords = map
				.markers()
				.iter()
				.map(|marker| (marker.location.lng, marker.location.lat))
				.collect::<Vec<_>>();
			ctx.draw(&Points {
				coords: &coords,
				color: MARKER_COLOR,
			});
			for (index, marker) in map.markers().iter().enumerate() {
				ctx.print(
					marker.location.lng,
					marker.location.lat,
					Span::styled(format!(" {} {}", index + 1, marker.label), Style::default().fg(MARKER_COLOR)),
				);
			}

			ctx.print(center.lng, center.lat, Span::styled("+", Style::default().fg(Color::Yellow)));
		});

	frame.render_widget(canvas, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("Tab pane | arrows/hjkl move or pan (map) | 1-9 day | +/- zoom | q quit"),
			Line::from(
				"/ search | m pin at map center | r rename | d remove | t title | D dates | p participants | S submit",
			),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from(format!("Enter submit | Esc cancel | {}", app.status)),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 45, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	builder: &mut Builder<MapView>,
	ctx: &BuilderContext<'_>,
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => return true,
		KeyCode::Tab => app.focus = app.focus.next(),
		KeyCode::BackTab => app.focus = app.focus.prev(),
		KeyCode::Up | KeyCode::Char('k') => match app.focus {
			FocusPane::Days => shift_active_day(app, builder, ctx, -1),
			FocusPane::Places => app.place_index = app.place_index.saturating_sub(1),
			FocusPane::Map => builder.map_mut().pan(0, 1),
		},
		KeyCode::Down | KeyCode::Char('j') => match app.focus {
			FocusPane::Days => shift_active_day(app, builder, ctx, 1),
			FocusPane::Places => app.place_index = app.place_index.saturating_add(1),
			FocusPane::Map => builder.map_mut().pan(0, -1),
		},
		KeyCode::Left | KeyCode::Char('h') => {
			if app.focus == FocusPane::Map {
				builder.map_mut().pan(-1, 0);
			}
		}
		KeyCode::Right | KeyCode::Char('l') => {
			if app.focus == FocusPane::Map {
				builder.map_mut().pan(1, 0);
			}
		}
		KeyCode::Char('+') | KeyCode::Char('=') => builder.map_mut().zoom_by(1),
		KeyCode::Char('-') => builder.map_mut().zoom_by(-1),
		KeyCode::Char(digit @ '1'..='9') => {
			let day = digit.to_digit(10).unwrap_or(1);
			switch_day(app, builder, ctx, day);
		}
		KeyCode::Char('t') => {
			let title = builder.itinerary().title().to_string();
			app.mode = InputMode::Prompt(PromptState::with_input("Trip title", PromptKind::Title, title));
		}
		KeyCode::Char('D') => {
			app.mode = InputMode::Prompt(PromptState::new(
				"Trip dates as YYYY-MM-DD YYYY-MM-DD (clears every day's places)",
				PromptKind::Dates,
			));
		}
		KeyCode::Char('p') => {
			let participants = builder.itinerary().details().participants.to_string();
			app.mode = InputMode::Prompt(PromptState::with_input(
				"Participants",
				PromptKind::Participants,
				participants,
			));
		}
		KeyCode::Char('/') => {
			if builder.itinerary().details_complete() {
				let previous = builder.search_session().query_text().to_string();
				app.mode = InputMode::Prompt(PromptState::with_input(
					"Search places near the map center",
					PromptKind::Search,
					previous,
				));
			} else {
				app.status = "Set a title and dates before adding places".to_string();
			}
		}
		KeyCode::Char('m') => {
			let center = builder.map().center();
			match builder.drop_point(center, ctx.provider) {
				Some(_) => {
					app.focus = FocusPane::Places;
					app.place_index = usize::MAX;
					if let Err(err) = persist(ctx.draft_path, builder.itinerary()) {
						app.status = format!("error: {err}");
					}
					app.mode = InputMode::Prompt(rename_prompt(builder));
				}
				None => app.status = "Set a title and dates before adding places".to_string(),
			}
		}
		KeyCode::Char('r') | KeyCode::Enter => {
			if let Some(place_id) = app.selected_place_id(builder) {
				if builder.begin_edit(&place_id) {
					app.mode = InputMode::Prompt(rename_prompt(builder));
				}
			}
		}
		KeyCode::Char('d') => {
			if let Some(place_id) = app.selected_place_id(builder) {
				let name = builder
					.itinerary()
					.find_place(&place_id)
					.map(|(_, place)| place.name().to_string())
					.unwrap_or_default();
				app.mode = InputMode::Select(SelectState::new(
					format!("Remove {name}?"),
					SelectKind::RemovePlace { place_id },
					confirm_options("Remove", "Keep"),
				));
			}
		}
		KeyCode::Char('S') => match builder.submission() {
			Some(request) => {
				app.mode = InputMode::Select(SelectState::new(
					format!("Submit \"{}\" with {} places?", request.title, request.locations.len()),
					SelectKind::Submit,
					confirm_options("Submit", "Cancel"),
				));
			}
			None => {
				app.status = "Add a title, dates and at least one place before submitting".to_string();
			}
		},
		_ => {}
	}

	false
}

fn shift_active_day(app: &mut App, builder: &mut Builder<MapView>, ctx: &BuilderContext<'_>, delta: i64) {
	let day = i64::from(builder.itinerary().active_day()) + delta;
	if let Ok(day) = u32::try_from(day) {
		switch_day(app, builder, ctx, day);
	}
}

fn switch_day(app: &mut App, builder: &mut Builder<MapView>, ctx: &BuilderContext<'_>, day: u32) {
	if !builder.set_active_day(day) {
		return;
	}
	app.place_index = 0;
	app.status = format!("Day {day}");
	if let Err(err) = persist(ctx.draft_path, builder.itinerary()) {
		app.status = format!("error: {err}");
	}
}

fn handle_prompt_key(
	app: &mut App,
	code: KeyCode,
	builder: &mut Builder<MapView>,
	ctx: &BuilderContext<'_>,
) -> bool {
	match code {
		KeyCode::Esc => {
			if let InputMode::Prompt(PromptState {
				kind: PromptKind::Rename,
				..
			}) = &app.mode
			{
				builder.cancel_edit();
			}
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
				if matches!(prompt.kind, PromptKind::Rename) {
					builder.update_edit_draft(&prompt.input);
				}
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
				if matches!(prompt.kind, PromptKind::Rename) {
					builder.update_edit_draft(&prompt.input);
				}
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt.clone(), builder, ctx) {
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(
	app: &mut App,
	code: KeyCode,
	builder: &mut Builder<MapView>,
	ctx: &BuilderContext<'_>,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), app, builder, ctx) {
				Ok(SelectOutcome::NextPrompt(prompt)) => app.mode = InputMode::Prompt(prompt),
				Ok(SelectOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(
	prompt: PromptState,
	builder: &mut Builder<MapView>,
	ctx: &BuilderContext<'_>,
) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::Title => {
			let title = required_text(&prompt.input, "title")?;
			builder.set_title(&title);
			persist(ctx.draft_path, builder.itinerary())?;
			Ok(PromptOutcome::Done(format!("title: {title}")))
		}
		PromptKind::Dates => {
			let (start, end) = parse_date_range(&prompt.input)?;
			if !builder.set_dates(start, end) {
				return Err("end date is before start date".to_string());
			}
			persist(ctx.draft_path, builder.itinerary())?;
			Ok(PromptOutcome::Done(format!(
				"{start} to {end}, {} days",
				builder.itinerary().duration()
			)))
		}
		PromptKind::Participants => {
			let participants = prompt
				.input
				.trim()
				.parse::<u32>()
				.map_err(|_| "participants must be a whole number".to_string())?;
			if !builder.set_participants(participants) {
				return Err("at least one participant is required".to_string());
			}
			persist(ctx.draft_path, builder.itinerary())?;
			Ok(PromptOutcome::Done(format!("participants: {participants}")))
		}
		PromptKind::Search => {
			let query = required_text(&prompt.input, "search text")?;
			let near = builder.map().center();
			builder.search(&query, ctx.provider, near);

			let session = builder.search_session();
			if session.phase() != SearchPhase::Showing {
				return Ok(PromptOutcome::Done(format!("no places found for \"{query}\"")));
			}
			let options = session
				.results()
				.iter()
				.map(|candidate| {
					let mut label = candidate.name.clone().unwrap_or_else(|| "(unnamed)".to_string());
					if let Some(address) = &candidate.formatted_address {
						label.push_str(&format!(" | {address}"));
					}
					if let Some(rating) = candidate.rating {
						label.push_str(&format!(" | *{rating:.1}"));
					}
					SelectOption::new(label, Style::default())
				})
				.collect();
			Ok(PromptOutcome::Select(SelectState::new(
				format!("Results for \"{query}\""),
				SelectKind::SearchResult,
				options,
			)))
		}
		PromptKind::Rename => {
			builder.update_edit_draft(&prompt.input);
			let renamed = builder.commit_edit();
			persist(ctx.draft_path, builder.itinerary())?;
			if renamed {
				Ok(PromptOutcome::Done(format!("renamed to {}", prompt.input.trim())))
			} else {
				Ok(PromptOutcome::Done("name unchanged".to_string()))
			}
		}
	}
}

fn submit_select(
	select: SelectState,
	app: &mut App,
	builder: &mut Builder<MapView>,
	ctx: &BuilderContext<'_>,
) -> Result<SelectOutcome, String> {
	if select.options.is_empty() {
		return Err("no option selected".to_string());
	}

	match select.kind {
		SelectKind::SearchResult => {
			builder
				.select_result(select.selected)
				.ok_or_else(|| "could not place this result".to_string())?;
			persist(ctx.draft_path, builder.itinerary())?;
			app.focus = FocusPane::Places;
			app.place_index = usize::MAX;
			Ok(SelectOutcome::NextPrompt(rename_prompt(builder)))
		}
		SelectKind::RemovePlace { place_id } => {
			if select.selected != 0 {
				return Ok(SelectOutcome::Done("kept".to_string()));
			}
			if !builder.remove_place(&place_id) {
				return Err("place is no longer on this day".to_string());
			}
			persist(ctx.draft_path, builder.itinerary())?;
			Ok(SelectOutcome::Done("place removed".to_string()))
		}
		SelectKind::Submit => {
			if select.selected != 0 {
				return Ok(SelectOutcome::Done("submission cancelled".to_string()));
			}
			let request = builder
				.submission()
				.ok_or_else(|| "plan is not ready to submit".to_string())?;
			let plan = ctx.backend.create_plan(&request).map_err(|err| err.to_string())?;
			tracing::info!(id = %plan.id, title = %plan.title, "plan submitted");
			Ok(SelectOutcome::Done(format!("submitted plan {}", plan.id)))
		}
	}
}

fn rename_prompt(builder: &Builder<MapView>) -> PromptState {
	let draft = builder.edit().draft().to_string();
	PromptState::with_input("Place name (blank keeps the current one)", PromptKind::Rename, draft)
}

fn confirm_options(yes: &str, no: &str) -> Vec<SelectOption> {
	vec![
		SelectOption::new(yes, Style::default().fg(Color::Yellow)),
		SelectOption::new(no, Style::default()),
	]
}

fn persist(path: &Path, itinerary: &Itinerary) -> Result<(), String> {
	save_draft(path, itinerary).map_err(|err| err.to_string())
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn parse_date_range(input: &str) -> Result<(NaiveDate, NaiveDate), String> {
	let parts = input.split_whitespace().collect::<Vec<_>>();
	let [start, end] = parts.as_slice() else {
		return Err("expected two dates: YYYY-MM-DD YYYY-MM-DD".to_string());
	};
	let parse = |value: &str| {
		NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| format!("invalid date: {value}"))
	};
	Ok((parse(start)?, parse(end)?))
}

fn day_date(details: &TripDetails, day: u32) -> Option<NaiveDate> {
	let start = details.start_date?;
	start.checked_add_signed(Duration::days(i64::from(day.checked_sub(1)?)))
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

/// Plain listing of a draft for the `draft` command.
pub fn print_itinerary(itinerary: &Itinerary) {
	let details = itinerary.details();
	let dates = match (details.start_date, details.end_date) {
		(Some(start), Some(end)) => format!("{start} to {end}"),
		_ => "dates not set".to_string(),
	};
	println!(
		"{} | {dates} | {} participants",
		if details.title.is_empty() { "(untitled trip)" } else { details.title.as_str() },
		details.participants
	);

	for bucket in itinerary.days() {
		let date = day_date(details, bucket.day())
			.map(|date| format!(" ({date})"))
			.unwrap_or_default();
		let marker = if bucket.day() == itinerary.active_day() { "*" } else { " " };
		println!("{marker}Day {}{date}", bucket.day());
		if bucket.is_empty() {
			println!("    (no places)");
		}
		for (index, place) in bucket.places().iter().enumerate() {
			println!("    {}. {} [{}] {}", index + 1, place.name(), place.id(), place.address());
		}
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	Select(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
enum SelectOutcome {
	NextPrompt(PromptState),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self::with_input(title, kind, String::new())
	}

	fn with_input(title: impl Into<String>, kind: PromptKind, input: String) -> Self {
		Self {
			title: title.into(),
			input,
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	Title,
	Dates,
	Participants,
	Search,
	Rename,
}

#[derive(Debug, Clone)]
enum SelectKind {
	SearchResult,
	RemovePlace { place_id: String },
	Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPane {
	Days,
	Places,
	Map,
}

impl FocusPane {
	fn next(self) -> Self {
		match self {
			FocusPane::Days => FocusPane::Places,
			FocusPane::Places => FocusPane::Map,
			FocusPane::Map => FocusPane::Days,
		}
	}

	fn prev(self) -> Self {
		match self {
			FocusPane::Days => FocusPane::Map,
			FocusPane::Places => FocusPane::Days,
			FocusPane::Map => FocusPane::Places,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	focus: FocusPane,
	place_index: usize,
	mode: InputMode,
	status: String,
}

impl Default for App {
	fn default() -> Self {
		Self {
			focus: FocusPane::Places,
			place_index: 0,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}
}

impl App {
	fn clamp_selection(&mut self, builder: &Builder<MapView>) {
		let count = builder
			.itinerary()
			.active_bucket()
			.map(|bucket| bucket.places().len())
			.unwrap_or(0);
		self.place_index = self.place_index.min(count.saturating_sub(1));
	}

	fn selected_place_id(&self, builder: &Builder<MapView>) -> Option<String> {
		builder
			.itinerary()
			.active_bucket()?
			.places()
			.get(self.place_index)
			.map(|place| place.id().to_string())
	}
}

#[cfg(test)]
mod tests {
	use chrono::NaiveDate;
	use pretty_assertions::assert_eq;

	use super::{FocusPane, SelectKind, SelectState, confirm_options, day_date, parse_date_range};
	use crate::domain::TripDetails;

	#[test]
	fn parses_two_dates() {
		assert_eq!(
			parse_date_range(" 2024-05-03   2024-05-05 "),
			Ok((
				NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
				NaiveDate::from_ymd_opt(2024, 5, 5).unwrap()
			))
		);
		assert!(parse_date_range("2024-05-03").is_err());
		assert!(parse_date_range("2024-05-03 tomorrow").is_err());
	}

	#[test]
	fn day_dates_follow_start_date() {
		let details = TripDetails {
			title: "Gangneung".to_string(),
			start_date: NaiveDate::from_ymd_opt(2024, 2, 28),
			end_date: NaiveDate::from_ymd_opt(2024, 3, 1),
			participants: 2,
		};
		assert_eq!(day_date(&details, 3), NaiveDate::from_ymd_opt(2024, 3, 1));
		assert_eq!(day_date(&details, 0), None);
		assert_eq!(day_date(&TripDetails::default(), 1), None);
	}

	#[test]
	fn selection_stays_in_range() {
		let mut select = SelectState::new("Remove?", SelectKind::Submit, confirm_options("Yes", "No"));
		select.move_selection(-3);
		assert_eq!(select.selected, 0);
		select.move_selection(5);
		assert_eq!(select.selected, 1);
		assert_eq!(select.selected_option().map(|option| option.label.as_str()), Some("No"));
	}

	#[test]
	fn focus_cycles_both_ways() {
		assert_eq!(FocusPane::Map.next(), FocusPane::Days);
		assert_eq!(FocusPane::Days.prev(), FocusPane::Map);
		assert_eq!(FocusPane::Places.next().prev(), FocusPane::Places);
	}
}
