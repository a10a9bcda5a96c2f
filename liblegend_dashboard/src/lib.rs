//! # legend_dashboard
//!
//! legend_dashboard is the L200 monitoring dashboard, written in Rust. It reads the
//! monitoring files produced by the automatic processing of the L200 physics runs and
//! shows the germanium detector parameters as time series or histograms, optionally
//! overlaid with slow control data.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, see the
//! [Rust docs](https://www.rust-lang.org/tools/install) for installation instructions.
//!
//! ### HDF5
//!
//! Before building, HDF5 must be installed. Typically this will be installed using a
//! package manager (homebrew, apt, etc), and the Rust libraries will auto detect the
//! location of the HDF install. If HDF5 lives in a custom location, write the following
//! snippet into the file `.cargo/config.toml` in the repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### Building & Install
//!
//! To install the native viewer use `cargo install --path ./legend_dashboard`, and for the
//! served dashboard use `cargo install --path ./legend_dashboard_cli`.
//!
//! ## Configuration
//!
//! Both applications read the same YAML configuration:
//!
//! ```yml
//! base: $_/prodenv/ref
//! cal: $_/prodenv/ref
//! phy: $_/prodenv/ref
//! sipm: None
//! muon: None
//! tmp: /tmp/dashboard
//! llama: None
//! run_info: null
//! channel_map: null
//! display_utc_offset_hours: 2
//! ```
//!
//! `$_` expands to the directory containing the configuration file and relative paths are
//! anchored there. If `run_info` or `channel_map` are null, `<base>/runinfo.yaml` and
//! `<base>/channelmap.yaml` are used.
//!
//! ## Data layout
//!
//! ```text
//! <phy>/generated/plt/hit/phy/<period>/<run>/
//! |---- l200-<period>-<run>-phy-geds.hdf              pandas HDFStore, one table per quantity
//! |---- l200-<period>-<run>-phy-geds-info.yaml        keys and <quantity>_info records
//! |---- l200-<period>-<run>-phy-slow_control.hdf      tstamp, value, unit per SC channel
//! |---- l200-<period>-<run>-phy-slow_control-info.yaml
//! ```
//!
//! The tables of a quantity are `<type>_<value>` (absolute), `<type>_<value>_var`
//! (relative variation in %) and `<type>_<value>_mean`, with one column per DAQ raw id.
pub mod catalogue;
pub mod channel_map;
pub mod config;
pub mod error;
pub mod figure;
pub mod frame;
pub mod hdf_reader;
pub mod histogram;
pub mod monitor;
pub mod palette;
pub mod plot_meta;
pub mod retrieval;
pub mod run_info;
pub mod selection;
pub mod time_plot;
pub mod view;
