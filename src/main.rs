use std::env;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use log::info;
use rand::Rng;
use thingmeter::{
    BoundPolicy, FontRegistry, GaugeAnimator, GaugeConfig, MeterCommand, MeterWindow, ThingMeter,
    WindowOptions,
};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    font: Option<PathBuf>,
    period: Option<Duration>,
    exact_bounds: bool,
    random: bool,
    ticker: bool,
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut parsed = Args::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(args.next().ok_or("--config needs a path")?.into()),
            "--font" => parsed.font = Some(args.next().ok_or("--font needs a path")?.into()),
            "--period" => {
                let ms: u64 = args.next().ok_or("--period needs milliseconds")?.parse()?;
                parsed.period = Some(Duration::from_millis(ms.max(1)));
            }
            "--exact-bounds" => parsed.exact_bounds = true,
            "--random" => parsed.random = true,
            "--ticker" => parsed.ticker = true,
            other => return Err(format!("unknown argument `{other}`").into()),
        }
    }
    Ok(parsed)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => GaugeConfig::load(path)?,
        None => GaugeConfig::builder().label("Thing").build(),
    };
    let (min_value, max_value) = (config.min_value, config.max_value);

    let mut fonts = FontRegistry::with_system_default();
    if let Some(path) = &args.font {
        if config.font_id == 0 {
            fonts.set_default_bytes(std::fs::read(path)?)?;
        } else {
            fonts.register_file(config.font_id, path)?;
        }
    }

    let meter = ThingMeter::new(config, fonts)?;
    let window = MeterWindow::new(meter, WindowOptions::default());

    let (sender, receiver) = mpsc::channel();
    if args.random {
        info!("feeding random values in [{min_value}, {max_value}]");
        let period = args.period.unwrap_or(Duration::from_millis(500));
        thread::spawn(move || {
            let mut rng = rand::rng();
            loop {
                let value = rng.random_range(min_value..=max_value);
                if sender.send(MeterCommand::SetValue(value)).is_err() {
                    break;
                }
                thread::sleep(period);
            }
        });
        return Ok(window.show_with_commands(receiver)?);
    }

    let policy = if args.exact_bounds {
        BoundPolicy::ExactMatch
    } else {
        BoundPolicy::Reflect
    };
    let mut animator = GaugeAnimator::builder()
        .maybe_period(args.period)
        .policy(policy)
        .build();

    if args.ticker {
        let _ticker = animator.spawn(sender);
        Ok(window.with_animator(animator).show_with_commands(receiver)?)
    } else {
        animator.start(Instant::now());
        Ok(window.with_animator(animator).show()?)
    }
}
