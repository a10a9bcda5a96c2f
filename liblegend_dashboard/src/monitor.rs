use std::path::Path;
use std::time::Instant;

use super::catalogue::PlotStyle;
use super::channel_map::ChannelMap;
use super::config::Config;
use super::error::{MonitorError, StoreError};
use super::figure::Figure;
use super::hdf_reader::{FrameSource, PandasStore};
use super::histogram::build_histogram;
use super::retrieval::{retrieve_with, PhySeries, Retrieval, RetrievalContext};
use super::run_info::RunDatabase;
use super::selection::{Selection, SelectionEvent};
use super::time_plot::{build_time_plot, PlotContext};

/// Session state of the physics monitoring page. Immutable once loaded; every render
/// reads its data afresh.
#[derive(Debug, Clone)]
pub struct PhyMonitor {
    config: Config,
    runs: RunDatabase,
    channels: ChannelMap,
}

impl PhyMonitor {
    /// Load the run database and channel map named by the config
    pub fn new(config: Config) -> Result<Self, MonitorError> {
        let runs = RunDatabase::read_file(&config.run_info_path())?;
        let channels = ChannelMap::read_file(&config.channel_map_path())?;
        spdlog::info!(
            "Loaded {} periods and {} detectors",
            runs.periods().len(),
            channels.detectors().len()
        );
        Ok(Self::from_parts(config, runs, channels))
    }

    pub fn from_parts(config: Config, runs: RunDatabase, channels: ChannelMap) -> Self {
        Self {
            config,
            runs,
            channels,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runs(&self) -> &RunDatabase {
        &self.runs
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub fn initial_selection(&self) -> Selection {
        Selection::initial(&self.runs, &self.channels)
    }

    pub fn apply(&self, selection: &Selection, event: SelectionEvent) -> Selection {
        selection.apply(event, &self.runs, &self.channels)
    }

    /// Build the figure for a selection from the HDF5 monitoring files
    pub fn render(&self, selection: &Selection) -> Figure {
        self.render_with(selection, PandasStore::open)
    }

    pub fn render_with<S, O>(&self, selection: &Selection, open: O) -> Figure
    where
        S: FrameSource,
        O: Fn(&Path) -> Result<S, StoreError>,
    {
        let start = Instant::now();
        let ctx = RetrievalContext {
            config: &self.config,
            runs: &self.runs,
            channels: &self.channels,
        };
        let figure = match retrieve_with(ctx, selection, open) {
            Retrieval::Found(series) => {
                let run_label = self.runs.run_label(&selection.period, &selection.run);
                let plot_ctx = PlotContext {
                    run_label: &run_label,
                    selection,
                    display_offset: self.config.display_offset(),
                };
                build_figure(&series, &plot_ctx)
            }
            Retrieval::Missing(message) => Figure::placeholder(message),
        };
        spdlog::debug!(
            "Rendered {} | {} in {:?}",
            figure.title,
            selection.plot_style.label(),
            start.elapsed()
        );
        figure
    }
}

/// Dispatch to the builder for the selected plot style
pub fn build_figure(series: &PhySeries, ctx: &PlotContext<'_>) -> Figure {
    match ctx.selection.plot_style {
        PlotStyle::Time => build_time_plot(series, ctx),
        PlotStyle::Histogram => build_histogram(series, ctx),
    }
}
