use crate::status::model::{PointView, SurveyModel};
#[cfg(test)]
use crate::status::model::{PointsView, StatusView};
use anyhow::Context;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use surveycore::telemetry::{LogManager, Metrics};
use surveycore::{SurveyPoint, SurveyStore};
use tokio::runtime::Builder;
use warp::Filter;

/// Shared survey snapshot, optionally exposed over HTTP for a floorplan viewer.
///
/// The measurement loop only ever writes to it; the HTTP side only reads.
#[derive(Clone)]
pub struct StatusBridge {
    state: Arc<RwLock<SurveyModel>>,
    logger: LogManager,
}

impl StatusBridge {
    pub fn new(title: &str, logger: LogManager) -> Self {
        Self {
            state: Arc::new(RwLock::new(SurveyModel::new(title))),
            logger,
        }
    }

    /// Start the HTTP endpoint on its own thread and return the bound address.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<SocketAddr> {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());

        let points_route = warp::path("points")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<SurveyModel>>| {
                let view = state
                    .read()
                    .map(|guard| guard.points.clone())
                    .unwrap_or_default();
                warp::reply::json(&view)
            });

        let status_route = warp::path("status")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter)
            .map(|state: Arc<RwLock<SurveyModel>>| {
                let view = state
                    .read()
                    .map(|guard| guard.status.clone())
                    .unwrap_or_default();
                warp::reply::json(&view)
            });

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for status bridge")?;
        let (bound, server) = {
            let _guard = runtime.enter();
            warp::serve(points_route.or(status_route))
                .try_bind_ephemeral(addr)
                .with_context(|| format!("binding status bridge to {addr}"))?
        };

        thread::spawn(move || runtime.block_on(server));
        self.logger
            .record(&format!("status bridge listening on http://{bound}"));
        Ok(bound)
    }

    fn update(&self, apply: impl FnOnce(&mut SurveyModel)) {
        match self.state.write() {
            Ok(mut guard) => apply(&mut guard),
            Err(_) => self.logger.warn("status bridge state is poisoned"),
        }
    }

    pub fn publish_points(&self, store: &SurveyStore) {
        self.update(|model| model.set_points(store));
    }

    pub fn publish_active(&self, point: Option<&SurveyPoint>) {
        self.update(|model| model.points.active = point.map(PointView::from));
    }

    /// Replace the status line, the equivalent of a window status bar.
    pub fn publish_status(&self, message: &str) {
        self.logger.record(message);
        self.update(|model| model.status.status = message.to_string());
    }

    pub fn publish_metrics(&self, metrics: Metrics) {
        self.update(|model| model.status.metrics = metrics);
    }

    #[cfg(test)]
    pub fn points(&self) -> PointsView {
        self.state
            .read()
            .map(|guard| guard.points.clone())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusView {
        self.state
            .read()
            .map(|guard| guard.status.clone())
            .unwrap_or_default()
    }
}
