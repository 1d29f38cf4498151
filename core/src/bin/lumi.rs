use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing::info;

use lumi_core::screens::{self, ScreenModel};
use lumi_core::{
    BookingRequest, ClientConfig, DateRange, Locale, LumiClient, Phase, Repository,
    ReqwestTransport, ViewData, ViewState,
};

#[derive(Parser)]
#[command(name = "lumi", about = "Browse masters and book beauty services")]
struct Cli {
    /// API base URL (overrides LUMI_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Caller id sent as the bearer credential (overrides LUMI_CALLER_ID)
    #[arg(long)]
    caller: Option<i64>,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Masters on your list, or in a city with --city
    Masters {
        #[arg(long)]
        city: Option<i64>,
    },
    /// One master's services and schedule
    Master { id: i64 },
    /// Free time slots for a service
    Slots {
        master: i64,
        service: i64,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Book a service; START is YYYY-MM-DDTHH:MM
    Book {
        master: i64,
        service: i64,
        start: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Your bookings
    Bookings,
    /// Available cities
    Cities,
    /// Add a master to your list
    Add { id: i64 },
    /// Remove a master from your list
    Remove { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    lumi_core::logging::init_cli_logger(cli.verbose);

    let config = load_config(&cli)?;
    info!(base_url = %config.base_url, caller = %config.caller, "configured");
    let repository = Repository::new(
        LumiClient::new(&config.base_url),
        config.transport()?,
        config.caller,
    );

    run(cli.command, &repository).await
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let caller_override = cli.caller.map(|id| id.to_string());
    let config = ClientConfig::from_vars(|name| match name {
        "LUMI_API_BASE_URL" if cli.base_url.is_some() => cli.base_url.clone(),
        "LUMI_CALLER_ID" if caller_override.is_some() => caller_override.clone(),
        _ => std::env::var(name).ok(),
    })
    .context("invalid client configuration")?;
    Ok(config)
}

async fn run(command: Command, repository: &Repository<ReqwestTransport>) -> Result<()> {
    match command {
        Command::Masters { city } => {
            let screen = match city {
                Some(city) => screens::city_masters_screen(repository, city),
                None => screens::masters_screen(repository),
            };
            show(&screen, "no masters yet", |masters| {
                for m in masters {
                    println!(
                        "#{} {} ({}) - {} services",
                        m.id,
                        m.name,
                        m.city_name.as_deref().unwrap_or("no city"),
                        m.services_count
                    );
                }
            })
            .await
        }
        Command::Master { id } => {
            let screen = screens::master_detail_screen(repository, id);
            show(&screen, "master not available", |detail| {
                let Some(detail) = detail else { return };
                println!("#{} {}", detail.id, detail.name);
                if let Some(description) = &detail.description {
                    println!("  {description}");
                }
                for s in &detail.services {
                    println!(
                        "  service #{} {} - {:.2}, {} min",
                        s.id, s.title, s.price, s.duration_mins
                    );
                }
                for period in &detail.work_schedule {
                    let day = period
                        .weekday()
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| format!("day {}", period.weekday_index));
                    println!("  {day}: {}-{}", period.start_time, period.end_time);
                }
            })
            .await
        }
        Command::Slots {
            master,
            service,
            from,
            to,
        } => {
            let range = DateRange::new(from, to.unwrap_or(from))?;
            let screen = screens::time_slots_screen(repository, master, service, range);
            show(&screen, "no free slots", |slots| {
                for slot in slots.iter().filter(|slot| slot.available) {
                    println!("{} {}", slot.date, slot.time);
                }
            })
            .await
        }
        Command::Book {
            master,
            service,
            start,
            comment,
        } => {
            let start = NaiveDateTime::parse_from_str(&start, "%Y-%m-%dT%H:%M")
                .with_context(|| format!("start {start:?} is not YYYY-MM-DDTHH:MM"))?;
            let mut request = BookingRequest::new(master, service, start);
            request.comment = comment;
            let booking = repository.book(&request).await?;
            println!(
                "booking #{} {}: {} with {}, {} - {}, {:.2}",
                booking.id,
                booking.status,
                booking.service_title,
                booking.master_name,
                booking.start_datetime,
                booking.end_datetime,
                booking.price
            );
            Ok(())
        }
        Command::Bookings => {
            let screen = screens::bookings_screen(repository);
            show(&screen, "no bookings", |bookings| {
                for b in bookings {
                    println!(
                        "#{} {} {} with {} at {}",
                        b.id, b.status, b.service_title, b.master_name, b.start_datetime
                    );
                }
            })
            .await
        }
        Command::Cities => {
            let screen = screens::cities_screen(repository);
            show(&screen, "no cities", |cities| {
                for c in cities {
                    println!("#{} {} / {}", c.id, c.name(Locale::Ru), c.name(Locale::En));
                }
            })
            .await
        }
        Command::Add { id } => {
            let ack = repository.add_master(id).await?;
            println!("{}", ack.message);
            Ok(())
        }
        Command::Remove { id } => {
            let ack = repository.remove_master(id).await?;
            println!("{}", ack.message);
            Ok(())
        }
    }
}

/// Drive a screen from first display to a settled state and print it.
async fn show<T, F>(screen: &ScreenModel<T>, empty: &str, render: F) -> Result<()>
where
    T: ViewData,
    F: FnOnce(&T),
{
    screen.start();
    let state: ViewState<T> = screen.settled().await;
    match state.phase() {
        Phase::Loaded => {
            render(&state.data);
            Ok(())
        }
        Phase::Empty => {
            println!("{empty}");
            Ok(())
        }
        Phase::Error => bail!(state.error.unwrap_or_default()),
        Phase::Idle | Phase::Loading => bail!("screen did not settle"),
    }
}
