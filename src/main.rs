mod backend;
mod builder;
mod catalog;
mod config;
mod domain;
mod drafts;
mod edit;
mod gazetteer;
mod logging;
mod map;
mod provider;
mod route;
mod search;
mod session;
mod storage;
mod ui;

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};

use crate::backend::{HttpBackend, PlanBackend, SortBy, TravelPlan};
use crate::builder::{Builder, BuilderSettings};
use crate::catalog::{group_locations_by_day, list_with_fallback, location_summary, plan_with_fallback};
use crate::config::{Config, ConfigOverrides, state_dir};
use crate::domain::{Coordinates, Itinerary};
use crate::drafts::{default_draft_path, recent_drafts, remember_draft, resolve_draft_path};
use crate::gazetteer::GazetteerProvider;
use crate::logging::{DEFAULT_LOG_FILE, LogConfig, init_logging};
use crate::map::MapView;
use crate::provider::{GoogleMapsProvider, PlaceProvider};
use crate::route::format_distance;
use crate::session::AuthSession;
use crate::storage::{load_draft, save_draft};
use crate::ui::{BuilderContext, print_itinerary, run_builder};

#[derive(Debug, Parser)]
#[command(name = "trip-planner", about = "Plan multi-day trips and share them")]
struct Cli {
	#[arg(long, global = true)]
	draft: Option<PathBuf>,
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	#[arg(long, global = true)]
	api_url: Option<String>,
	#[arg(long, global = true)]
	maps_key: Option<String>,
	/// Use the offline gazetteer instead of the maps web service.
	#[arg(long, global = true)]
	offline: bool,
	#[arg(long, global = true)]
	gazetteer: Option<PathBuf>,
	#[arg(long, global = true)]
	log_file: Option<PathBuf>,
	#[arg(short, long, global = true, action = ArgAction::Count)]
	verbose: u8,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Plans {
		#[arg(long, value_enum, default_value_t = SortBy::Popular)]
		sort: SortBy,
	},
	Show {
		id: String,
	},
	Login {
		#[arg(long)]
		email: String,
		#[arg(long)]
		password: String,
	},
	Register {
		#[arg(long)]
		email: String,
		#[arg(long)]
		password: String,
		#[arg(long)]
		name: String,
	},
	Logout,
	Whoami,
	New {
		#[arg(long)]
		title: String,
		#[arg(long)]
		start: String,
		#[arg(long)]
		end: String,
		#[arg(long, default_value_t = 1)]
		participants: u32,
	},
	Dates {
		#[arg(long)]
		start: String,
		#[arg(long)]
		end: String,
	},
	Search {
		query: String,
		#[arg(long)]
		day: Option<u32>,
		/// Add the K-th result (1-based) to the day.
		#[arg(long)]
		pick: Option<usize>,
	},
	Drop {
		#[arg(long, allow_hyphen_values = true)]
		lat: f64,
		#[arg(long, allow_hyphen_values = true)]
		lng: f64,
		#[arg(long)]
		day: Option<u32>,
	},
	Rename {
		#[arg(long)]
		day: u32,
		#[arg(long)]
		place: String,
		#[arg(long)]
		name: String,
	},
	Remove {
		#[arg(long)]
		day: u32,
		#[arg(long)]
		place: String,
	},
	Draft,
	Build,
	Submit,
	Drafts {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let command = cli.command.unwrap_or(Command::Build);

	let log_file = match (&command, cli.log_file) {
		(_, Some(path)) => Some(path),
		(Command::Build, None) => Some(state_dir().join(DEFAULT_LOG_FILE)),
		_ => None,
	};
	init_logging(&LogConfig::from_verbosity(cli.verbose).with_log_file(log_file))?;

	let config = Config::load(ConfigOverrides {
		config_path: cli.config,
		api_url: cli.api_url,
		maps_api_key: cli.maps_key,
		gazetteer: cli.gazetteer,
	})?;
	tracing::debug!(api_url = %config.api_url, offline = cli.offline, "configuration loaded");

	match command {
		Command::Plans { sort } => {
			let backend = HttpBackend::new(config.api_url.as_str(), None)?;
			print_plans(&list_with_fallback(&backend, sort));
		}
		Command::Show { id } => {
			let backend = HttpBackend::new(config.api_url.as_str(), None)?;
			print_plan(&plan_with_fallback(&backend, &id)?);
		}
		Command::Login { email, password } => {
			let backend = HttpBackend::new(config.api_url.as_str(), None)?;
			let session = AuthSession::from(backend.login(&email, &password)?);
			session.save()?;
			println!("signed in as {} <{}>", session.user.name, session.user.email);
		}
		Command::Register { email, password, name } => {
			let backend = HttpBackend::new(config.api_url.as_str(), None)?;
			let session = AuthSession::from(backend.register(&email, &password, &name)?);
			session.save()?;
			println!("registered and signed in as {} <{}>", session.user.name, session.user.email);
		}
		Command::Logout => {
			if AuthSession::clear()? {
				println!("signed out");
			} else {
				println!("not signed in");
			}
		}
		Command::Whoami => match AuthSession::load()? {
			Some(session) => println!("{} <{}> (id {})", session.user.name, session.user.email, session.user.id),
			None => println!("not signed in"),
		},
		Command::New {
			title,
			start,
			end,
			participants,
		} => {
			let path = cli.draft.unwrap_or_else(|| default_draft_path(&title));
			let mut itinerary = Itinerary::new();
			itinerary.set_title(title.trim());
			if !itinerary.set_participants(participants) {
				return Err("at least one participant is required".into());
			}
			if !itinerary.set_date_range(parse_date(&start)?, parse_date(&end)?) {
				return Err("end date is before start date".into());
			}
			save_draft(&path, &itinerary)?;
			remember(&path);
			println!("created {}-day draft at {}", itinerary.duration(), path.display());
		}
		Command::Drafts { limit } => {
			print_recent_drafts(limit)?;
		}
		command => run_draft_command(command, cli.draft, cli.offline, &config)?,
	}

	Ok(())
}

/// Commands that open the current draft.
fn run_draft_command(
	command: Command,
	draft: Option<PathBuf>,
	offline: bool,
	config: &Config,
) -> Result<(), Box<dyn Error>> {
	let path = resolve_draft_path(draft)?;
	let itinerary = load_draft(&path)?;
	remember(&path);
	tracing::debug!(path = %path.display(), places = itinerary.place_count(), "draft loaded");

	let mut builder = Builder::new(
		itinerary,
		MapView::new(config.map_center),
		BuilderSettings::from(config),
	);

	match command {
		Command::Dates { start, end } => {
			if !builder.set_dates(parse_date(&start)?, parse_date(&end)?) {
				return Err("end date is before start date".into());
			}
			save_draft(&path, builder.itinerary())?;
			println!(
				"trip now runs {} days; all places were cleared",
				builder.itinerary().duration()
			);
		}
		Command::Search { query, day, pick } => {
			let provider = place_provider(config, offline)?;
			select_day(&mut builder, day)?;
			let near = builder.map().center();
			builder.search(&query, provider.as_ref(), near);

			let results = builder.search_session().results();
			if results.is_empty() {
				println!("no places found for \"{query}\"");
				return Ok(());
			}
			for (index, candidate) in results.iter().enumerate() {
				println!(
					"{:>2}. {} | {}{}",
					index + 1,
					candidate.name.as_deref().unwrap_or("(unnamed)"),
					candidate.formatted_address.as_deref().unwrap_or("-"),
					candidate
						.rating
						.map(|rating| format!(" | *{rating:.1}"))
						.unwrap_or_default()
				);
			}

			if let Some(pick) = pick {
				let place_id = pick
					.checked_sub(1)
					.and_then(|index| builder.select_result(index))
					.ok_or("no such result, or the draft needs a title and dates first")?;
				save_draft(&path, builder.itinerary())?;
				println!("added {place_id} to day {}", builder.itinerary().active_day());
			}
		}
		Command::Drop { lat, lng, day } => {
			let provider = place_provider(config, offline)?;
			select_day(&mut builder, day)?;
			let place_id = builder
				.drop_point(Coordinates::new(lat, lng), provider.as_ref())
				.ok_or("set a title and dates before adding places")?;
			save_draft(&path, builder.itinerary())?;
			if let Some((day, place)) = builder.itinerary().find_place(&place_id) {
				println!("added {place_id} to day {day}: {}", place.address());
			}
		}
		Command::Rename { day, place, name } => {
			match builder.itinerary().find_place(&place) {
				Some((found, _)) if found == day => {}
				_ => return Err(format!("no place {place} on day {day}").into()),
			}
			builder.begin_edit(&place);
			builder.update_edit_draft(&name);
			if builder.commit_edit() {
				save_draft(&path, builder.itinerary())?;
				println!("renamed {place} to {}", name.trim());
			} else {
				println!("name unchanged");
			}
		}
		Command::Remove { day, place } => {
			select_day(&mut builder, Some(day))?;
			if !builder.remove_place(&place) {
				return Err(format!("no place {place} on day {day}").into());
			}
			save_draft(&path, builder.itinerary())?;
			println!("removed {place} from day {day}");
		}
		Command::Draft => {
			print_itinerary(builder.itinerary());
		}
		Command::Submit => {
			let session = AuthSession::require()?;
			let backend = HttpBackend::new(config.api_url.as_str(), Some(&session))?;
			let request = builder
				.submission()
				.ok_or("the draft needs a title, dates and at least one place")?;
			let plan = backend.create_plan(&request)?;
			println!("submitted plan {} ({} locations)", plan.id, request.locations.len());
		}
		Command::Build => {
			let session = AuthSession::require()?;
			let backend = HttpBackend::new(config.api_url.as_str(), Some(&session))?;
			let provider = place_provider(config, offline)?;
			let ctx = BuilderContext {
				provider: provider.as_ref(),
				backend: &backend,
				draft_path: &path,
			};
			run_builder(&mut builder, &ctx)?;
			save_draft(&path, builder.itinerary())?;
		}
		Command::Plans { .. }
		| Command::Show { .. }
		| Command::Login { .. }
		| Command::Register { .. }
		| Command::Logout
		| Command::Whoami
		| Command::New { .. }
		| Command::Drafts { .. } => {}
	}

	Ok(())
}

fn place_provider(config: &Config, offline: bool) -> Result<Box<dyn PlaceProvider>, Box<dyn Error>> {
	if offline {
		let gazetteer = match &config.gazetteer {
			Some(path) => GazetteerProvider::load(path)?,
			None => GazetteerProvider::builtin(),
		};
		if gazetteer.is_empty() {
			tracing::warn!("offline gazetteer has no entries; searches will find nothing");
		}
		tracing::debug!(entries = gazetteer.len(), "using offline gazetteer");
		return Ok(Box::new(gazetteer));
	}

	Ok(Box::new(GoogleMapsProvider::new(config.maps_api_key.clone())?))
}

fn select_day(builder: &mut Builder<MapView>, day: Option<u32>) -> Result<(), Box<dyn Error>> {
	if let Some(day) = day {
		if !builder.set_active_day(day) {
			return Err(format!(
				"day {day} is outside the trip (1-{})",
				builder.itinerary().duration()
			)
			.into());
		}
	}
	Ok(())
}

fn remember(path: &Path) {
	if let Err(err) = remember_draft(path) {
		eprintln!("warning: failed to store recent draft: {err}");
	}
}

fn parse_date(input: &str) -> Result<NaiveDate, Box<dyn Error>> {
	Ok(NaiveDate::parse_from_str(input, "%Y-%m-%d")?)
}

fn print_recent_drafts(limit: usize) -> Result<(), Box<dyn Error>> {
	let rows = recent_drafts(limit)?;
	if rows.is_empty() {
		println!("no recent drafts");
		return Ok(());
	}

	for (index, path) in rows.iter().enumerate() {
		println!("{:>2}. {}", index + 1, path.display());
	}

	Ok(())
}

fn print_plans(plans: &[TravelPlan]) {
	if plans.is_empty() {
		println!("no plans");
		return;
	}

	for plan in plans {
		println!(
			"{:<24} {} | {} to {} | {} pax | {} likes",
			plan.id, plan.title, plan.start_date, plan.end_date, plan.participants, plan.likes
		);
		println!("{:<24} {}", "", location_summary(plan));
	}
}

fn print_plan(plan: &TravelPlan) {
	println!("{} ({})", plan.title, plan.id);
	println!(
		"{} to {} | {} days | {} participants | {} likes",
		plan.start_date, plan.end_date, plan.duration, plan.participants, plan.likes
	);
	if !plan.description.is_empty() {
		println!("{}", plan.description);
	}

	let groups = group_locations_by_day(plan);
	if groups.is_empty() {
		println!("no locations");
		return;
	}

	for group in groups {
		println!("Day {} | {}", group.day, format_distance(group.route().total_km()));
		for (index, location) in group.locations.iter().enumerate() {
			println!(
				"    {}. {}{}",
				index + 1,
				location.name.as_deref().unwrap_or("(unnamed)"),
				location
					.address
					.as_deref()
					.map(|address| format!(" | {address}"))
					.unwrap_or_default()
			);
		}
	}
}
