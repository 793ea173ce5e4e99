use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod contact;
mod controller;
mod domain;
mod inputter;
mod loader;
mod model;
mod pipeline;
mod render;
mod ui;

use config::{Args, TVConfig};
use controller::Controller;
use domain::{Message, RenderError, TVError};
use loader::ContactsLoader;
use model::{Effect, Model, Status};
use render::RenderTarget;
use ui::FrameTarget;

fn main() -> ExitCode {
    let args = Args::parse();
    match TVConfig::try_from(args).and_then(|cfg| run(&cfg)) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(cfg: &TVConfig) -> Result<(), TVError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .map_err(|e| TVError::Logging(format!("{}: {e}", cfg.log_file.display())))?;
    let filter =
        EnvFilter::try_new(&cfg.log_level).map_err(|e| TVError::Logging(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| TVError::Logging(e.to_string()))
}

fn run(cfg: &TVConfig) -> Result<(), TVError> {
    init_logging(cfg)?;
    info!("Starting ctv against {}", cfg.base_url);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let loader = ContactsLoader::new(cfg.base_url.clone());
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let spawn_fetch = |loader: &ContactsLoader| {
        let loader = loader.clone();
        let tx = tx.clone();
        runtime.spawn(async move {
            let result = loader.load().await;
            if tx.send(Message::Loaded(result)).is_err() {
                warn!("UI went away before contacts arrived");
            }
        });
    };

    let mut model = Model::init(cfg);
    let controller = Controller::new(cfg);
    if let Some(Effect::Fetch) = model.request_fetch() {
        spawn_fetch(&loader);
    }

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &controller, &mut rx, |_| {
        spawn_fetch(&loader)
    });
    ratatui::restore();

    info!("Quitting ctv");
    runtime.shutdown_background();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    controller: &Controller,
    rx: &mut mpsc::UnboundedReceiver<Message>,
    mut on_effect: impl FnMut(Effect),
) -> Result<(), TVError> {
    let mut last_render_error = None;

    while model.status != Status::QUITTING {
        // A terminal too small for the table keeps its last frame.
        let size = terminal.size()?;
        let rendered = if ui::table_fits(Rect::new(0, 0, size.width, size.height)) {
            let page = render::render(model);
            let mut rendered = Ok(());
            terminal.draw(|f| rendered = FrameTarget::new(f).render(&page))?;
            rendered
        } else {
            Err(RenderError::RenderTargetMissing("table body"))
        };
        match rendered {
            Err(e) if last_render_error.as_ref() != Some(&e) => {
                error!("{e}");
                last_render_error = Some(e);
            }
            Err(_) => {}
            Ok(()) => last_render_error = None,
        }

        // Loaded data first, then at most one key press.
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        if let Some(msg) = controller.handle_event(model)? {
            messages.push(msg);
        }

        for msg in messages {
            if let Some(effect) = model.update(msg) {
                on_effect(effect);
            }
        }
    }
    Ok(())
}
