//! PixelScope command-line interface.
//!
//! Loads images, reconciles them through a [`ViewerSession`] the same way an
//! interactive viewer does, and prints histograms, profiles, statistics and
//! diffs as delimited text or JSON.
#![allow(clippy::too_many_lines)]

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info, LevelFilter};
use pixelscope_analysis::{
    diff_images, AnalysisEngine, DelimitedTable, Histogram, HistogramConfig, ScaledHistogram,
    StatsTable, DEFAULT_DIFF_OFFSET,
};
use pixelscope_core::{
    AnalysisView, BitShift, BrightnessProfile, ChannelColor, CoordinateMode, DtypeClass, DualMode,
    HistogramScale, Image, ImageRect, MonoMode, PreferencesUpdate, ProfileOrientation,
    ViewerSession,
};
use pixelscope_io::{load, ImageMetadata, LoaderRegistry, StateFile};
use thiserror::Error;

/// Highest channel count the state commands will size a store for.
const MAX_CHANNELS: usize = 4096;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Load(#[from] pixelscope_io::LoadError),

    #[error("{0}")]
    Core(#[from] pixelscope_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("channel {channel} out of range for a {channels}-channel image")]
    ChannelOutOfRange { channel: usize, channels: usize },

    #[error("channel {channel} exceeds the supported maximum of {max} channels")]
    TooManyChannels { channel: usize, max: usize },

    #[error("--state <FILE> is required for '{0}'")]
    MissingState(&'static str),
}

/// Profile axis.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Orientation {
    /// Column means across the ROI
    H,
    /// Row means down the ROI
    V,
    /// Samples along the ROI diagonal
    D,
}

/// Single-channel colouring.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mono {
    Grayscale,
    Jet,
}

impl From<Mono> for MonoMode {
    fn from(value: Mono) -> Self {
        match value {
            Mono::Grayscale => Self::Grayscale,
            Mono::Jet => Self::Jet,
        }
    }
}

/// Two-channel colouring.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dual {
    /// Tint each channel with its colour and sum
    Composite,
    /// Read the channels as a flow field
    FlowHsv,
}

impl From<Dual> for DualMode {
    fn from(value: Dual) -> Self {
        match value {
            Dual::Composite => Self::Composite,
            Dual::FlowHsv => Self::FlowHsv,
        }
    }
}

impl From<Orientation> for ProfileOrientation {
    fn from(value: Orientation) -> Self {
        match value {
            Orientation::H => Self::Horizontal,
            Orientation::V => Self::Vertical,
            Orientation::D => Self::Diagonal,
        }
    }
}

/// Image inspection from the command line.
#[derive(Parser)]
#[command(name = "pixelscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Persisted display state (channel visibility, colours and brightness)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Display settings applied before analysis.
#[derive(Args, Debug, Clone)]
struct ViewArgs {
    /// Region of interest as x0,y0,x1,y1 (exclusive end)
    #[arg(long, value_parser = parse_roi)]
    roi: Option<ImageRect>,

    /// Channels to hide, comma-separated
    #[arg(long, value_delimiter = ',')]
    hide: Vec<usize>,

    /// Bit shift applied on top of the gain (positive brightens)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    shift: i32,

    /// Brightness offset for this image's class
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Brightness gain for this image's class
    #[arg(long)]
    gain: Option<f64>,

    /// Brightness saturation for this image's class
    #[arg(long)]
    saturation: Option<f64>,
}

/// Output formatting.
#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Column delimiter for table output
    #[arg(short, long, default_value = ",")]
    delimiter: char,

    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print per-channel statistics instead of the series
    #[arg(long)]
    stats: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show file, shape and type information
    Info {
        /// Input image
        input: PathBuf,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Histogram of the displayed ROI
    Histogram {
        /// Input image
        input: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Number of bins (defaults depend on the image type)
        #[arg(long)]
        bins: Option<usize>,

        /// Report log10(count + 1)
        #[arg(long)]
        log: bool,
    },

    /// Line profile through the displayed ROI
    Profile {
        /// Input image
        input: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Profile axis
        #[arg(long, value_enum, default_value = "h")]
        orientation: Orientation,

        /// Report image coordinates instead of ROI offsets
        #[arg(long)]
        absolute: bool,
    },

    /// Statistics of (a - b) + offset over the raw samples
    Diff {
        /// Minuend image
        a: PathBuf,

        /// Subtrahend image
        b: PathBuf,

        /// Constant added to every difference
        #[arg(long, default_value_t = DEFAULT_DIFF_OFFSET, allow_hyphen_values = true)]
        offset: f64,

        /// Region of interest as x0,y0,x1,y1 (exclusive end)
        #[arg(long, value_parser = parse_roi)]
        roi: Option<ImageRect>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show or change the stored brightness profile of a type class
    Brightness {
        /// Type class: float, uint8, uint16 or wide
        dtype: DtypeClass,

        #[arg(long, allow_hyphen_values = true)]
        offset: Option<f64>,

        #[arg(long)]
        gain: Option<f64>,

        #[arg(long)]
        saturation: Option<f64>,

        /// Restore the class defaults
        #[arg(long, conflicts_with_all = ["offset", "gain", "saturation"])]
        reset: bool,
    },

    /// Show or change stored channel visibility
    Channels {
        /// Channels to hide, comma-separated
        #[arg(long, value_delimiter = ',')]
        hide: Vec<usize>,

        /// Channels to show, comma-separated
        #[arg(long, value_delimiter = ',')]
        show: Vec<usize>,

        /// Make every channel visible
        #[arg(long)]
        reset: bool,
    },

    /// Show or change stored channel colours and 1-/2-channel modes
    Colors {
        /// Channel count whose palette is shown or changed
        count: usize,

        /// Channel colour as index=#rrggbb, repeatable
        #[arg(long = "set", value_parser = parse_color_assignment)]
        assignments: Vec<(usize, ChannelColor)>,

        /// Single-channel colouring
        #[arg(long, value_enum)]
        mono: Option<Mono>,

        /// Two-channel colouring
        #[arg(long, value_enum)]
        dual: Option<Dual>,

        /// Restore the default palette for this count
        #[arg(long, conflicts_with = "assignments")]
        reset: bool,
    },
}

fn parse_roi(value: &str) -> std::result::Result<ImageRect, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid ROI '{value}': {e}"))?;
    match parts.as_slice() {
        &[x0, y0, x1, y1] => ImageRect::new(x0, y0, x1, y1)
            .ok_or_else(|| format!("empty ROI '{value}': need x0 < x1 and y0 < y1")),
        _ => Err(format!("ROI '{value}' must have four values x0,y0,x1,y1")),
    }
}

fn parse_color_assignment(value: &str) -> std::result::Result<(usize, ChannelColor), String> {
    let (index, color) = value
        .split_once('=')
        .ok_or_else(|| format!("'{value}' must look like index=#rrggbb"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid channel index in '{value}': {e}"))?;
    Ok((index, color.parse()?))
}

/// Store length needed to address every index in `hide` and `show`.
fn required_channels(hide: &[usize], show: &[usize]) -> Result<usize> {
    let mut needed = 0;
    for &channel in hide.iter().chain(show) {
        if channel >= MAX_CHANNELS {
            return Err(CliError::TooManyChannels {
                channel,
                max: MAX_CHANNELS,
            });
        }
        needed = needed.max(channel.saturating_add(1));
    }
    Ok(needed)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn open_session(state: Option<&Path>) -> Result<ViewerSession> {
    let session = ViewerSession::new();
    let Some(path) = state else {
        return Ok(session);
    };
    let (channels, colors, display) = StateFile::load_or_default(path)?.restore();
    info!("restored display state from {}", path.display());
    Ok(session.with_stores(channels, display).with_color_store(colors))
}

fn save_session(session: &ViewerSession, path: &Path) -> Result<()> {
    StateFile::capture(session.channels(), session.colors(), session.display()).save(path)?;
    info!("saved display state to {}", path.display());
    Ok(())
}

/// Merge any overrides into the stored profile for `dtype`.
fn apply_brightness(
    session: &mut ViewerSession,
    dtype: DtypeClass,
    offset: Option<f64>,
    gain: Option<f64>,
    saturation: Option<f64>,
) -> Result<BrightnessProfile> {
    let current = session.display_mut().brightness_profile(dtype);
    if offset.is_none() && gain.is_none() && saturation.is_none() {
        return Ok(current);
    }
    let requested = BrightnessProfile::new(
        offset.unwrap_or(current.offset),
        gain.unwrap_or(current.gain),
        saturation.unwrap_or(current.saturation),
    );
    Ok(session.display_mut().set_brightness_profile(dtype, requested)?)
}

fn hide_channels(session: &mut ViewerSession, hide: &[usize], channels: usize) -> Result<()> {
    for &channel in hide {
        if channel >= channels {
            return Err(CliError::ChannelOutOfRange { channel, channels });
        }
        session.channels_mut().set_visible(channel, false)?;
    }
    Ok(())
}

/// Reconcile `image` and snapshot what an analysis window would see.
fn prepare_view(
    session: &mut ViewerSession,
    image: &Image,
    view: &ViewArgs,
    update: PreferencesUpdate,
) -> Result<AnalysisView> {
    session.open_analysis();
    session.switch_image(image);
    apply_brightness(session, image.dtype(), view.offset, view.gain, view.saturation)?;
    hide_channels(session, &view.hide, image.shape().channels)?;
    session.set_shift(BitShift::new(view.shift));
    if let Some(roi) = view.roi {
        let clipped = session.selection_mut().set_rect(roi);
        if clipped != roi {
            info!("ROI {roi} clipped to {clipped}");
        }
    }
    session.display_mut().set_analysis_preferences(update);
    Ok(session.analysis_view(image))
}

fn print_histogram(histogram: &Histogram, scale: HistogramScale, delimiter: char) {
    let text = match scale {
        HistogramScale::Linear => histogram.to_delimited(delimiter),
        HistogramScale::Log => ScaledHistogram::new(histogram, scale).to_delimited(delimiter),
    };
    println!("{text}");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let state = cli.state.as_deref();

    match cli.command {
        Commands::Info { input, json } => {
            let registry = LoaderRegistry::with_defaults();
            debug!(
                "loaders: {}",
                registry.names().collect::<Vec<_>>().join(", ")
            );
            let image = registry.load(&input)?;
            let metadata = ImageMetadata::from_image(&input, &image)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                let mut session = open_session(state)?;
                let profile = session.switch_image(&image);
                println!("{metadata}");
                println!(
                    "display:  offset {} gain {} saturation {}",
                    profile.offset, profile.gain, profile.saturation
                );
            }
        }

        Commands::Histogram {
            input,
            view,
            output,
            bins,
            log,
        } => {
            let image = load(&input)?;
            let mut session = open_session(state)?;
            let scale = if log {
                HistogramScale::Log
            } else {
                HistogramScale::Linear
            };
            let snapshot = prepare_view(
                &mut session,
                &image,
                &view,
                PreferencesUpdate::default().with_histogram_scale(scale),
            )?;
            let config = bins.map_or_else(HistogramConfig::default, |bins| {
                HistogramConfig::default().with_bins(bins)
            });
            let histogram = AnalysisEngine::new(config).histogram(&snapshot);
            info!(
                "{} bins over ROI {} ({} channel(s))",
                histogram.bin_count(),
                snapshot.roi,
                histogram.channels.len()
            );

            if output.json {
                println!("{}", serde_json::to_string_pretty(&histogram)?);
            } else if output.stats {
                println!("{}", StatsTable::from(&histogram).to_delimited(output.delimiter));
            } else {
                print_histogram(&histogram, snapshot.preferences.histogram_scale, output.delimiter);
            }
        }

        Commands::Profile {
            input,
            view,
            output,
            orientation,
            absolute,
        } => {
            let image = load(&input)?;
            let mut session = open_session(state)?;
            let mode = if absolute {
                CoordinateMode::Absolute
            } else {
                CoordinateMode::Relative
            };
            let snapshot = prepare_view(
                &mut session,
                &image,
                &view,
                PreferencesUpdate::default()
                    .with_orientation(orientation.into())
                    .with_coordinate_mode(mode),
            )?;
            let profile = AnalysisEngine::default().profile(&snapshot);

            if output.json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else if output.stats {
                println!("{}", StatsTable::from(&profile).to_delimited(output.delimiter));
            } else {
                println!("{}", profile.to_delimited(output.delimiter));
            }
        }

        Commands::Diff {
            a,
            b,
            offset,
            roi,
            output,
        } => {
            let diff = diff_images(&load(&a)?, &load(&b)?, offset)?;
            let shape = diff.shape();
            let roi = roi.map_or_else(
                || diff.buffer.bounds(),
                |rect| rect.clipped_to(shape.width, shape.height),
            );
            let visible: Vec<usize> = (0..shape.channels).collect();
            let table = StatsTable::from_region(&diff.buffer, roi, &visible);
            if output.json {
                println!("{}", serde_json::to_string_pretty(&table.rows)?);
            } else {
                println!(
                    "# {} ({}, {})",
                    diff.source.as_deref().unwrap_or("diff"),
                    shape,
                    diff.dtype()
                );
                println!("{}", table.to_delimited(output.delimiter));
            }
        }

        Commands::Brightness {
            dtype,
            offset,
            gain,
            saturation,
            reset,
        } => {
            let path = state.ok_or(CliError::MissingState("brightness"))?;
            let mut session = open_session(Some(path))?;
            let profile = if reset {
                session.display_mut().reset_to_defaults(dtype)
            } else {
                apply_brightness(&mut session, dtype, offset, gain, saturation)?
            };
            save_session(&session, path)?;
            println!(
                "{dtype}: offset {} gain {} saturation {}",
                profile.offset, profile.gain, profile.saturation
            );
        }

        Commands::Channels { hide, show, reset } => {
            let path = state.ok_or(CliError::MissingState("channels"))?;
            let mut session = open_session(Some(path))?;
            let needed = required_channels(&hide, &show)?;
            let channels = session.channels_mut();
            channels.on_image_switch(needed);
            if reset {
                channels.reset();
            }
            for &channel in &show {
                channels.set_visible(channel, true)?;
            }
            for &channel in &hide {
                channels.set_visible(channel, false)?;
            }
            save_session(&session, path)?;
            let flags: Vec<String> = session
                .channels()
                .flags()
                .iter()
                .enumerate()
                .map(|(channel, &visible)| format!("{channel}:{}", if visible { "on" } else { "off" }))
                .collect();
            println!("{}", flags.join(" "));
        }

        Commands::Colors {
            count,
            assignments,
            mono,
            dual,
            reset,
        } => {
            let path = state.ok_or(CliError::MissingState("colors"))?;
            if count > MAX_CHANNELS {
                return Err(CliError::TooManyChannels {
                    channel: count,
                    max: MAX_CHANNELS,
                });
            }
            let mut session = open_session(Some(path))?;
            let colors = session.colors_mut();
            if reset {
                colors.reset(count);
            }
            for (channel, color) in assignments {
                if channel >= count {
                    return Err(CliError::ChannelOutOfRange {
                        channel,
                        channels: count,
                    });
                }
                colors.set_color(count, channel, color)?;
            }
            if let Some(mode) = mono {
                colors.set_mono_mode(mode.into());
            }
            if let Some(mode) = dual {
                colors.set_dual_mode(mode.into());
            }
            let palette: Vec<String> = colors
                .colors(count)
                .iter()
                .enumerate()
                .map(|(channel, color)| format!("{channel}:{color}"))
                .collect();
            let (mono, dual) = (colors.mono_mode(), colors.dual_mode());
            save_session(&session, path)?;
            println!("{}", palette.join(" "));
            println!("mono: {mono:?}  dual: {dual:?}");
        }
    }

    Ok(())
}
