/// Logging configuration: a `tracing-subscriber` `fmt` layer driven by `RUST_LOG`, with `-v`
/// repeats raising the default verbosity when `RUST_LOG` is unset (§10.1). No OTLP exporter:
/// distributed trace export is out of scope for this engine.
#[derive(Debug, Clone, clap::Parser)]
pub struct LoggingConfig {
    /// Increase log verbosity; repeat for more (`-v`, `-vv`, `-vvv`). Ignored when `RUST_LOG` is
    /// set.
    #[clap(short, long, parse(from_occurrences), global = true)]
    pub verbose: u8,
}

impl LoggingConfig {
    /// Install the global `tracing` subscriber. Must be called once, before any façade call.
    pub fn init(&self) {
        let default_directive = match self.verbose {
            0 => "kbo=info",
            1 => "kbo=debug",
            _ => "kbo=trace",
        };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }
}
