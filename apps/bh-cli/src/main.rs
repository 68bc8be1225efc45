use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use bh_app::{
    AppResult, RealtimeRequest, RunOptions, RunProgressEvent, RunRequest, RunTimingSummary,
    project_service, query, run_service, setup_compile,
};
use bh_sim::{RuntimeReport, SineTableSpec};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "buckhil")]
#[command(about = "buckhil - hardware-in-the-loop buck converter simulator", long_about = None)]
struct Cli {
    /// Print wall-clock timing of the run phases
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and values
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Run a deterministic lockstep simulation and cache the result
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// End time in seconds (defaults to run.t_end_s)
        #[arg(long)]
        t_end: Option<f64>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// Run the timer and plant contexts on two threads
    Realtime {
        /// Path to the project file
        project_path: PathBuf,
        /// Number of timer firings
        #[arg(long, default_value_t = 20_000)]
        ticks: u64,
        /// Fire as fast as possible instead of pacing at the step size
        #[arg(long)]
        free_running: bool,
    },
    /// List cached runs for a project
    Runs {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export one variable of a run as CSV
    ExportSeries {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID
        run_id: String,
        /// inductor_current, output_voltage, switch or duty
        variable: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a reference-board project file
    Init {
        /// Path of the new project file (.yaml or .json)
        path: PathBuf,
        /// Project name
        #[arg(long, default_value = "buck")]
        name: String,
    },
    /// Generate a sine lookup table for the output DAC as C source
    DacTable {
        /// Wave frequency in Hz
        #[arg(long, default_value_t = 60.0)]
        freq: f64,
        /// Samples per cycle
        #[arg(long, default_value_t = 200)]
        samples: usize,
        /// DAC resolution in bits
        #[arg(long, default_value_t = 12)]
        bits: u8,
        /// Normalized amplitude in [0, 1]
        #[arg(long, default_value_t = 0.95)]
        amplitude: f64,
        /// Timer clock in Hz
        #[arg(long, default_value_t = bh_app::DEFAULT_TIMER_CLOCK_HZ)]
        clock: f64,
        /// Output file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.timing {
        bh_core::timing::enable_timing();
    }

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            t_end,
            no_cache,
        } => cmd_run(&project_path, t_end, !no_cache),
        Commands::Realtime {
            project_path,
            ticks,
            free_running,
        } => cmd_realtime(&project_path, ticks, !free_running),
        Commands::Runs { project_path } => cmd_runs(&project_path),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id),
        Commands::ExportSeries {
            project_path,
            run_id,
            variable,
            output,
        } => cmd_export_series(&project_path, &run_id, &variable, output.as_deref()),
        Commands::Init { path, name } => cmd_init(&path, &name),
        Commands::DacTable {
            freq,
            samples,
            bits,
            amplitude,
            clock,
            output,
        } => cmd_dac_table(
            SineTableSpec {
                wave_hz: freq,
                samples_per_cycle: samples,
                bits,
                amplitude,
            },
            clock,
            output.as_deref(),
        ),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    let setup = setup_compile::compile_setup(&project)?;
    println!("✓ Project is valid");
    println!(
        "  {} steps per PWM period, ideal output {:.3} V",
        setup.timing.steps_per_period(),
        setup.params.ideal_output(setup.duty.initial())
    );
    Ok(())
}

fn cmd_run(project_path: &Path, t_end: Option<f64>, use_cache: bool) -> AppResult<()> {
    println!("Running lockstep simulation: {}", project_path.display());

    let request = RunRequest {
        project_path,
        t_end_s: t_end,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }

    print_timing_summary(&response.timing);

    let counters = &response.manifest.counters;
    println!(
        "  Ticks: {}  steps: {}  coalesced: {}",
        counters.ticks, counters.steps, counters.coalesced
    );
    print_run_summary(project_path, &response.run_id)
}

fn cmd_realtime(project_path: &Path, ticks: u64, paced: bool) -> AppResult<()> {
    println!(
        "Running {} real-time firings ({})",
        ticks,
        if paced { "paced" } else { "free-running" }
    );
    let report = bh_app::run_realtime_project(&RealtimeRequest {
        project_path,
        ticks,
        paced,
    })?;
    print_realtime_report(&report);
    Ok(())
}

fn print_realtime_report(report: &RuntimeReport) {
    println!("\nReal-time report:");
    println!("  Ticks fired:   {}", report.ticks);
    println!("  Steps taken:   {}", report.steps);
    println!("  Coalesced:     {}", report.coalesced);
    println!("  Late firings:  {}", report.late_ticks);
    println!("  Wall time:     {:.3}s", report.wall_time_s);
    println!(
        "  Final state:   i_L = {:.4} A, v_out = {:.4} V",
        report.final_state.inductor_current, report.final_state.output_voltage
    );
    if report.fire_timing.count > 0 {
        report.fire_timing.print("timer firing");
    }
    if report.step_timing.count > 0 {
        report.step_timing.print("plant step");
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_timing_summary(timing: &RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);

    println!("\nTiming summary:");
    println!(
        "  Compile:  {:.3}s ({:.1}%)",
        timing.compile_time_s,
        100.0 * timing.compile_time_s / total
    );
    println!(
        "  Simulate: {:.3}s ({:.1}%)",
        timing.simulate_time_s,
        100.0 * timing.simulate_time_s / total
    );
    println!(
        "  Save:     {:.3}s ({:.1}%)",
        timing.save_time_s,
        100.0 * timing.save_time_s / total
    );
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:    {:.3}s", timing.total_time_s);
}

fn print_run_summary(project_path: &Path, run_id: &str) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let dac = setup_compile::compile_dac(&project)?;
    let (_manifest, records) = run_service::load_run(project_path, run_id)?;
    let summary =
        query::get_run_summary(&records, 1.0 / project.timing.pwm_frequency_hz, dac.as_ref())?;

    println!("\nRun summary:");
    println!("  Time points: {}", summary.record_count);
    println!(
        "  Time range: {:.6} - {:.6} s",
        summary.time_range.0, summary.time_range.1
    );
    println!(
        "  Final state: i_L = {:.4} A, v_out = {:.4} V",
        summary.final_inductor_current_a, summary.final_output_voltage_v
    );
    println!(
        "  Output over last PWM period: mean {:.4} V, ripple {:.4} V",
        summary.output_mean_v, summary.output_ripple_v
    );
    if let Some(code) = summary.output_dac_code {
        println!("  Output DAC code: {}", code);
    }
    Ok(())
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(project_path)?;

    if runs.is_empty() {
        println!("No cached runs found for: {}", project_path.display());
    } else {
        println!("Cached runs:");
        for manifest in runs {
            println!(
                "  {} ({}, {} steps, {} coalesced)",
                manifest.run_id,
                manifest.timestamp,
                manifest.counters.steps,
                manifest.counters.coalesced
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);
    let (manifest, _records) = run_service::load_run(project_path, run_id)?;
    println!("  Project: {}", manifest.project_name);
    println!("  Created: {}", manifest.timestamp);
    println!("  Mode: {:?}", manifest.run_type);
    println!("  Solver version: {}", manifest.solver_version);
    print_run_summary(project_path, run_id)?;
    println!("\nVariables:");
    for name in query::SERIES_VARIABLES {
        println!("  {}", name);
    }
    Ok(())
}

fn cmd_export_series(
    project_path: &Path,
    run_id: &str,
    variable: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let (_manifest, records) = run_service::load_run(project_path, run_id)?;
    let series = query::extract_series(&records, variable)?;

    let mut csv = String::from("time_s,value\n");
    for (t, val) in &series {
        csv.push_str(&format!("{},{}\n", t, val));
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            series.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }

    Ok(())
}

fn cmd_init(path: &Path, name: &str) -> AppResult<()> {
    project_service::init_project(path, name)?;
    println!("✓ Wrote project {} to {}", name, path.display());
    Ok(())
}

fn cmd_dac_table(spec: SineTableSpec, clock_hz: f64, output: Option<&Path>) -> AppResult<()> {
    let (table, source) = bh_app::render_sine_table(spec, clock_hz)?;

    if let Some(path) = output {
        std::fs::write(path, source)?;
        println!("✓ Wrote {} samples to {}", table.codes.len(), path.display());
        println!("  Sample rate: {:.2} Hz", table.sample_rate_hz);
        println!(
            "  Timer period ({:.0} MHz clock): {}",
            clock_hz / 1e6,
            table.timer_period(clock_hz)
        );
        println!("  Code range: {} to {}", table.min_code(), table.max_code());
    } else {
        print!("{}", source);
    }
    Ok(())
}
