use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollcall_core::Identity;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rollcall", about = "Rollcall attendance gate CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a student from a captured image file
    Enroll {
        #[arg(long)]
        name: String,
        #[arg(long)]
        roll: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        semester: String,
        /// Path to a PNG/JPEG capture of the student's face
        #[arg(long)]
        image: PathBuf,
    },
    /// Run one recognition session and mark attendance
    Recognize,
    /// List enrolled students
    Students {
        #[arg(long, default_value = "")]
        department: String,
        #[arg(long, default_value = "")]
        class: String,
        #[arg(long, default_value = "")]
        semester: String,
    },
    /// Show everyone's status for a date (default: today)
    Attendance {
        #[arg(long, default_value = "")]
        date: String,
    },
    /// Remove an enrolled student by id
    Remove { id: String },
    /// Search attendance history by student name
    Search { name: String },
    /// Show dashboard counts for a date (default: today)
    Summary {
        #[arg(long, default_value = "")]
        date: String,
    },
    /// Show daemon status
    Status,
}

#[zbus::proxy(
    interface = "org.rollcall.Attendance1",
    default_service = "org.rollcall.Attendance1",
    default_path = "/org/rollcall/Attendance1"
)]
trait Rollcall {
    async fn enroll(&self, identity_json: &str, image: Vec<u8>) -> zbus::Result<String>;
    async fn recognize(&self) -> zbus::Result<String>;
    async fn list_students(
        &self,
        department: &str,
        class: &str,
        semester: &str,
    ) -> zbus::Result<String>;
    async fn attendance_on(&self, date: &str) -> zbus::Result<String>;
    async fn remove_student(&self, id: &str) -> zbus::Result<String>;
    async fn search_attendance(&self, name: &str) -> zbus::Result<String>;
    async fn summary(&self, date: &str) -> zbus::Result<String>;
    async fn status(&self) -> zbus::Result<String>;
}

/// Print a daemon reply: the message line, then pretty data if present.
fn render(reply: &str) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(reply) else {
        println!("{reply}");
        return;
    };

    if let Some(message) = value["message"].as_str() {
        if !message.is_empty() {
            println!("{message}");
        }
    }
    if let Some(data) = value.get("data") {
        if !data.is_null() {
            println!(
                "{}",
                serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let conn = zbus::Connection::system()
        .await
        .context("connecting to the system bus (is rollcalld running?)")?;
    let proxy = RollcallProxy::new(&conn).await?;

    let reply = match cli.command {
        Commands::Enroll {
            name,
            roll,
            department,
            class,
            semester,
            image,
        } => {
            let identity = Identity {
                display_name: name,
                roll_number: roll,
                department,
                class,
                semester,
            };
            let bytes = std::fs::read(&image)
                .with_context(|| format!("reading image {}", image.display()))?;
            let identity_json = serde_json::to_string(&identity)?;
            proxy.enroll(&identity_json, bytes).await?
        }
        Commands::Recognize => proxy.recognize().await?,
        Commands::Students {
            department,
            class,
            semester,
        } => proxy.list_students(&department, &class, &semester).await?,
        Commands::Attendance { date } => proxy.attendance_on(&date).await?,
        Commands::Remove { id } => proxy.remove_student(&id).await?,
        Commands::Search { name } => proxy.search_attendance(&name).await?,
        Commands::Summary { date } => proxy.summary(&date).await?,
        Commands::Status => proxy.status().await?,
    };

    render(&reply);
    Ok(())
}
