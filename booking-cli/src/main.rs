use booking_client::{
    BookingClientHttp, BookingClientTrait, CreateSlotsRequest, RegisterRequest,
    ReservationStatus, Role, ServiceType,
};
use clap::{Parser, ValueEnum};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "booking", about = "Book home services from the terminal")]
struct Cli {
    #[clap(short, long, env = "BOOKING_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Customer,
    Provider,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ServiceArg {
    Electrician,
    Carpentry,
    CarWasher,
    Plumbing,
    ApplianceRepair,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Pending,
    Confirmed,
    Cancelled,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Customer => Role::Customer,
            RoleArg::Provider => Role::Provider,
        }
    }
}

impl From<ServiceArg> for ServiceType {
    fn from(kind: ServiceArg) -> Self {
        match kind {
            ServiceArg::Electrician => ServiceType::Electrician,
            ServiceArg::Carpentry => ServiceType::Carpentry,
            ServiceArg::CarWasher => ServiceType::CarWasher,
            ServiceArg::Plumbing => ServiceType::Plumbing,
            ServiceArg::ApplianceRepair => ServiceType::ApplianceRepair,
        }
    }
}

impl From<StatusArg> for ReservationStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => ReservationStatus::Pending,
            StatusArg::Confirmed => ReservationStatus::Confirmed,
            StatusArg::Cancelled => ReservationStatus::Cancelled,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Check that the server is up.
    Health,
    Register {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
        #[clap(long, value_enum)]
        role: Option<RoleArg>,
        #[clap(long, value_enum)]
        service_type: Option<ServiceArg>,
    },
    Login {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    Me,
    Logout,
    /// Split a time window into bookable slots (providers).
    CreateSlots {
        /// YYYY-MM-DD
        #[clap(long)]
        date: String,
        /// HH:mm
        #[clap(long)]
        start: String,
        /// HH:mm
        #[clap(long)]
        end: String,
        #[clap(long, default_value_t = 60)]
        duration: i64,
        #[clap(long)]
        price: f64,
    },
    MySlots,
    Search {
        #[clap(long)]
        date: String,
        #[clap(long, value_enum)]
        service_type: ServiceArg,
    },
    GetSlot {
        id: Uuid,
    },
    DeleteSlot {
        id: Uuid,
    },
    Book {
        slot_id: Uuid,
    },
    MyReservations,
    ProviderReservations,
    SetStatus {
        id: Uuid,
        #[clap(long, value_enum)]
        status: StatusArg,
    },
    Cancel {
        id: Uuid,
    },
    Confirm {
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let mut client = BookingClientHttp::connect(&args.server)?;

    match args.command {
        Command::Health => {
            let health = client.health().await?;
            println!("{} at {} (UTC{})", health.status, health.timestamp, health.timezone);
        }
        Command::Register {
            name,
            email,
            password,
            role,
            service_type,
        } => {
            let user = client
                .register(RegisterRequest {
                    name,
                    email,
                    password,
                    role: role.map(Role::from),
                    service_type: service_type.map(ServiceType::from),
                })
                .await?;
            println!("Registered {user}");
        }
        Command::Login { email, password } => {
            let user = client.login(email, password).await?;
            println!("Logged in as {user}");
        }
        Command::Me => println!("{}", client.me().await?),
        Command::Logout => println!("{}", client.logout().await?),
        Command::CreateSlots {
            date,
            start,
            end,
            duration,
            price,
        } => {
            let created = client
                .create_slots(CreateSlotsRequest {
                    date,
                    start_time: start,
                    end_time: end,
                    slot_duration_minutes: duration,
                    price,
                })
                .await?;
            println!("{}", created.message);
            for slot in created.slots {
                println!(
                    "- [{}] {} - {}  {:.2}  {:?}",
                    slot.id, slot.start_time, slot.end_time, slot.price, slot.status
                );
            }
        }
        Command::MySlots => {
            let slots = client.provider_slots().await?;
            println!("Slots ({})", slots.len());
            for slot in slots {
                print!(
                    "- [{}] {} - {}  {:.2}  {:?}",
                    slot.id, slot.start_time, slot.end_time, slot.price, slot.status
                );
                match slot.reservation {
                    Some(r) => println!("  reserved by {} ({}) [{}]", r.customer.name, r.customer.email, r.status),
                    None => println!(),
                }
            }
        }
        Command::Search { date, service_type } => {
            let slots = client
                .available_slots(&date, service_type.into())
                .await?;
            println!("Available slots ({})", slots.len());
            for slot in slots {
                println!("- {slot}");
            }
        }
        Command::GetSlot { id } => println!("{}", client.get_slot(id).await?),
        Command::DeleteSlot { id } => println!("{}", client.delete_slot(id).await?),
        Command::Book { slot_id } => {
            let booked = client.book(slot_id).await?;
            println!("{}\n{}", booked.message, booked.reservation);
        }
        Command::MyReservations => {
            for reservation in client.customer_reservations().await? {
                println!("- {reservation}");
            }
        }
        Command::ProviderReservations => {
            for reservation in client.provider_reservations().await? {
                println!("- {reservation}");
            }
        }
        Command::SetStatus { id, status } => {
            let updated = client.update_reservation_status(id, status.into()).await?;
            println!("{}", updated.message);
        }
        Command::Cancel { id } => println!("{}", client.cancel_reservation(id).await?.message),
        Command::Confirm { id } => println!("{}", client.confirm_reservation(id).await?.message),
    }

    Ok(())
}
