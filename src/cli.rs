// src/cli.rs

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, MASTER_KEY_ENV};
use crate::employee_service::EmployeeService;
use crate::events::{self, EventHub};
use crate::projection::FieldProjector;
use crate::query::EmployeeQuery;
use crate::rate_limit::AdmissionController;
use crate::snapshot::{self, SnapshotFile};
use crate::store::{MemoryStore, RecordStore};
use crate::web::{self, AppState};

// === CLI ===

#[derive(Parser)]
#[command(name = "employee-directory")]
#[command(author, version, about = "Multi-tenant employee directory backend", long_about = None)]
pub struct Cli {
    /// Путь к конфигу (YAML)
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Запустить веб-сервер (по умолчанию)
    Serve {
        /// Адрес для веб-сервера (например, 127.0.0.1:8080)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Импортировать сотрудников из CSV
    Import {
        #[arg(long)]
        org: String,
        file: PathBuf,
    },
    /// Выгрузить сотрудников в CSV
    Export {
        #[arg(long)]
        org: String,
        /// Файл; без него пишем в stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Показать сотрудников организации
    List {
        #[arg(long)]
        org: String,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 50)]
        page_size: i64,
        #[arg(long)]
        include_terminated: bool,
        #[arg(short, long)]
        json: bool,
    },
    /// Работа с конфигом
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Записать конфиг по умолчанию
    Init {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Собранные компоненты приложения
pub struct App {
    pub service: Arc<EmployeeService>,
    pub limiter: Arc<AdmissionController>,
    pub events: Arc<EventHub>,
}

/// Собрать хранилище, проектор, лимитер и сервис по конфигу
pub fn build_app(config: &AppConfig) -> Result<App, Box<dyn std::error::Error>> {
    let store: Arc<dyn RecordStore> = match &config.storage.snapshot_path {
        Some(path) => {
            let key_hex = config.storage.master_key_hex().ok_or_else(|| {
                format!("storage.snapshot_path requires storage.master_key_hex or {MASTER_KEY_ENV}")
            })?;
            let key = snapshot::parse_master_key(&key_hex)?;
            Arc::new(MemoryStore::with_snapshot(SnapshotFile::new(path, &key))?)
        }
        None => Arc::new(MemoryStore::new()),
    };

    let events = Arc::new(EventHub::new());
    let projector = FieldProjector::new(Arc::new(config.org_columns.clone()));
    let service = Arc::new(EmployeeService::new(store, projector, events.clone()));

    let limiter = Arc::new(
        AdmissionController::new(config.rate_limit.window(), config.rate_limit.max_requests)
            .with_max_keys(config.rate_limit.max_keys)
            .with_grace(config.rate_limit.grace()),
    );

    Ok(App {
        service,
        limiter,
        events,
    })
}

impl Cli {
    pub async fn run(self, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
        match self.command.unwrap_or(Command::Serve { addr: None }) {
            Command::Serve { addr } => serve(config, addr).await,
            Command::Config { cmd: ConfigCommand::Init { path } } => {
                let path = path.unwrap_or(self.config);
                AppConfig::default().save(&path)?;
                println!("✅ Конфиг записан: {}", path.display());
                Ok(())
            }
            command => run_offline(command, &config),
        }
    }
}

async fn serve(config: AppConfig, addr: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_app(&config)?;

    tokio::spawn(events::log_audit_events(app.events.subscribe()));
    web::spawn_limiter_sweeper(app.limiter.clone(), config.rate_limit.sweep_interval());

    if config.storage.seed_demo_data {
        app.service.seed_demo_data()?;
    }

    for org in config.org_columns.organizations() {
        info!(
            org,
            columns = ?config.org_columns.visible_for(org),
            "organization columns"
        );
    }

    let addr = addr.unwrap_or_else(|| config.server.address.clone());
    let state = AppState::new(app.service, app.limiter).with_server_config(&config);
    web::run_web_server(state, &addr).await
}

/// Команды без веб-сервера: работают напрямую с хранилищем
fn run_offline(command: Command, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.storage.snapshot_path.is_none() {
        eprintln!("⚠️  storage.snapshot_path не задан: изменения не сохранятся");
    }
    let app = build_app(config)?;

    match command {
        Command::Import { org, file } => {
            let bytes = std::fs::read(&file)?;
            let summary = app.service.import_csv(&org, &bytes, None)?;
            println!("✅ Импортировано: {}", summary.imported);
            for skipped in &summary.skipped {
                eprintln!("⚠️  строка {}: {}", skipped.row, skipped.reason);
            }
        }
        Command::Export { org, out } => {
            let body = app.service.export_csv(&org, None)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, body)?;
                    println!("✅ Выгрузка записана: {}", path.display());
                }
                None => print!("{}", String::from_utf8_lossy(&body)),
            }
        }
        Command::List {
            org,
            search,
            page,
            page_size,
            include_terminated,
            json,
        } => {
            let query = EmployeeQuery {
                search,
                include_terminated,
                page,
                page_size,
                ..Default::default()
            };
            let result = app.service.search(&org, &query, None)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result.items)?);
            } else {
                for employee in &result.items {
                    let extra: Vec<String> = employee
                        .attributes
                        .iter()
                        .map(|(field, value)| {
                            format!("{}={}", field, value.as_deref().unwrap_or("-"))
                        })
                        .collect();
                    println!(
                        "{} | {} {} | {} | {}",
                        employee.id,
                        employee.first_name,
                        employee.last_name,
                        employee.status,
                        extra.join(", ")
                    );
                }
                println!(
                    "страница {}/{}, всего {}",
                    result.page,
                    result.last_page().max(1),
                    result.total
                );
            }
        }
        Command::Serve { .. } | Command::Config { .. } => {}
    }

    Ok(())
}
