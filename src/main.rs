#![windows_subsystem = "windows"]
mod app;
mod avatar;
mod client;
mod config;
mod error;
mod form;
mod models;
mod results;
slint::include_modules!();

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use anyhow::Context;
use slint::{Model, ModelRc, SharedString, VecModel};
use tokio::runtime::Handle;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::User;
use crate::results::{ResultsObserver, ResultsState};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config);

    // Background tokio runtime for reqwest; components stay on the UI thread
    let rt = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;

    // Shared HTTP Client
    let http_client = client::build_client(&config)?;
    let transport = client::HttpTransport::new(http_client.clone(), rt.handle().clone());
    let search_client = Rc::new(client::SearchClient::new(transport, &config.api_url));

    // Create the UI
    let app = AppWindow::new()?;

    let window = Rc::new(WindowBridge {
        app: app.as_weak(),
        http_client,
        runtime: rt.handle().clone(),
        rendered: RefCell::new(Vec::new()),
    });
    let results = results::ResultsView::new(search_client.clone(), window, config.page_size);
    let page = app::SearchPage::new(results.clone());
    let form = form::SearchForm::new(search_client, page, config.page_size);

    // =============================================
    //  CALLBACK: search-requested
    // =============================================
    {
        let app_weak = app.as_weak();

        app.on_search_requested(move |query| {
            form.set_query(query.as_str());
            let search = form.submit(true);

            let Some(app) = app_weak.upgrade() else { return };
            app.set_show_validation_hint(
                form.state().has_submitted && !form.is_submit_enabled(true),
            );

            let Some(search) = search else { return };
            app.set_is_loading(true);
            app.set_error_message(SharedString::default());

            let app_weak = app_weak.clone();
            let form = form.clone();
            spawn_on_ui(async move {
                search.await;
                if let Some(app) = app_weak.upgrade() {
                    app.set_is_loading(form.state().is_loading);
                }
            });
        });
    }

    // =============================================
    //  CALLBACK: page-changed
    // =============================================
    {
        let app_weak = app.as_weak();

        app.on_page_changed(move |page| {
            if let Some(app) = app_weak.upgrade() {
                app.set_error_message(SharedString::default());
            }
            spawn_on_ui(results.on_page_change(i64::from(page)));
        });
    }

    // Run the Slint event loop
    app.run()?;

    Ok(())
}

fn init_logging(config: &Config) {
    let default_level = if config.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Runs a search future on the Slint event loop without blocking the caller.
fn spawn_on_ui(future: impl Future<Output = ()> + 'static) {
    if let Err(e) = slint::spawn_local(future) {
        error!(error = %e, "Failed to schedule search on the event loop");
    }
}

fn to_ui_int<N: TryInto<i32>>(n: N) -> i32 {
    n.try_into().unwrap_or(i32::MAX)
}

/// Pushes result state into the window.
struct WindowBridge {
    app: slint::Weak<AppWindow>,
    http_client: reqwest::Client,
    runtime: Handle,
    /// Users currently in the table model, to avoid rebuilding rows on unrelated input changes.
    rendered: RefCell<Vec<User>>,
}

impl WindowBridge {
    fn render_rows(&self, app: &AppWindow, users: &[User]) {
        if *self.rendered.borrow() == users {
            return;
        }
        *self.rendered.borrow_mut() = users.to_vec();

        let rows: Vec<UserRow> = users
            .iter()
            .map(|user| UserRow {
                login: user.login.as_str().into(),
                account_type: user.account_type.as_str().into(),
                avatar: slint::Image::default(),
            })
            .collect();
        app.set_users(ModelRc::new(VecModel::from(rows)));

        self.load_avatars(users);
    }

    /// Downloads all avatar thumbnails in parallel and patches each row that still shows the same user.
    fn load_avatars(&self, users: &[User]) {
        for (row, user) in users.iter().enumerate() {
            let client = self.http_client.clone();
            let app_weak = self.app.clone();
            let url = user.avatar_url.clone();
            let login = user.login.clone();

            self.runtime.spawn(async move {
                let Some(pixels) =
                    avatar::download_avatar_pixels(&client, &url, avatar::THUMBNAIL_SIZE).await
                else {
                    return;
                };

                let _ = app_weak.upgrade_in_event_loop(move |app| {
                    let users = app.get_users();
                    let Some(mut item) = users.row_data(row) else { return };
                    if item.login != login.as_str() {
                        return;
                    }
                    let buf = slint::SharedPixelBuffer::<slint::Rgba8Pixel>::clone_from_slice(
                        &pixels.rgba,
                        pixels.width,
                        pixels.height,
                    );
                    item.avatar = slint::Image::from_rgba8(buf);
                    users.set_row_data(row, item);
                });
            });
        }
    }
}

impl ResultsObserver for WindowBridge {
    fn results_changed(&self, state: &ResultsState) {
        let Some(app) = self.app.upgrade() else { return };

        self.render_rows(&app, &state.items);
        app.set_total_results(to_ui_int(state.total_count));
        app.set_current_page(to_ui_int(state.current_page));
        app.set_page_count(to_ui_int(state.page_count()));
    }

    fn notify_error(&self, message: &str) {
        if let Some(app) = self.app.upgrade() {
            app.set_error_message(message.into());
        }
    }
}
