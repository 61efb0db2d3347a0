use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use crossbeam::channel;
use log::{error, info, warn};
use crate::config::{BenchmarkCase, BenchmarkPlan};
use crate::error::{ConfigError, SimulationError};
use crate::io::open_trace;
use crate::report::{write_csv, ResultRow};
use crate::simulator::Simulator;

/// File name of the combined results written by [`write_results`]
pub const RESULTS_FILE_NAME: &str = "all_results.csv";

impl BenchmarkPlan {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SimulationError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, SimulationError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

/// A finished simulation of one plan case
#[derive(Debug)]
pub struct RunReport {
    pub case: BenchmarkCase,
    pub simulator: Simulator,
}

impl RunReport {
    /// The results row for this run, tagged with the trace's file name
    pub fn row(&self) -> ResultRow {
        let trace = &self.case.trace;
        let name = trace.file_name().map(Path::new).unwrap_or(trace);
        ResultRow::new(&self.simulator, Some(name.display().to_string()))
    }
}

/// What happened to one case of a plan. Failures are local to their case
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunReport),
    InvalidConfig { case: BenchmarkCase, error: ConfigError },
    MissingTrace { case: BenchmarkCase, error: io::Error },
    Failed { case: BenchmarkCase, error: SimulationError },
}

impl RunOutcome {
    pub fn case(&self) -> &BenchmarkCase {
        match self {
            RunOutcome::Completed(report) => &report.case,
            RunOutcome::InvalidConfig { case, .. } => case,
            RunOutcome::MissingTrace { case, .. } => case,
            RunOutcome::Failed { case, .. } => case,
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

fn resolve_trace(base_dir: &Path, trace: &Path) -> PathBuf {
    if trace.is_absolute() {
        trace.to_path_buf()
    } else {
        base_dir.join(trace)
    }
}

/// Runs a single case of a plan
pub fn run_case(case: &BenchmarkCase, base_dir: &Path) -> RunOutcome {
    let case = case.clone();
    let mut simulator = match Simulator::new(&case.cache) {
        Ok(simulator) => simulator,
        Err(error) => {
            warn!("Skipping invalid configuration {:?}: {error}", case.cache);
            return RunOutcome::InvalidConfig { case, error };
        }
    };
    let trace_path = resolve_trace(base_dir, &case.trace);
    let reader = match open_trace(&trace_path) {
        Ok(reader) => reader,
        Err(error) => {
            error!("Could not open trace file '{}': {error}", trace_path.display());
            return RunOutcome::MissingTrace { case, error };
        }
    };
    if let Err(error) = simulator.simulate(reader) {
        error!("Simulation of '{}' failed: {error}", trace_path.display());
        return RunOutcome::Failed { case, error };
    }
    info!(
        "Finished {} {}-way {}B/{}B on {} in {}s",
        case.cache.replacement_policy,
        case.cache.associativity,
        case.cache.capacity,
        case.cache.block_size,
        case.trace.display(),
        simulator.get_execution_time().as_nanos() as f64 / 1e9
    );
    RunOutcome::Completed(RunReport { case, simulator })
}

/// Runs every case of a plan, returning the outcomes in plan order
///
/// Each case owns its own cache, so with `jobs > 1` cases are spread over that many worker threads
/// with no coordination beyond the work queue. Results are re-ordered to match the plan
///
/// # Arguments
///
/// * `plan`: The cases to run
/// * `base_dir`: Directory relative trace paths are resolved against
/// * `jobs`: Number of worker threads, 0 and 1 both run on the calling thread
///
/// returns: Vec<RunOutcome>
pub fn run_plan(plan: &BenchmarkPlan, base_dir: &Path, jobs: usize) -> Vec<RunOutcome> {
    if jobs <= 1 || plan.runs.len() <= 1 {
        return plan.runs.iter().map(|case| run_case(case, base_dir)).collect();
    }
    let (work_sender, work_receiver) = channel::unbounded::<(usize, &BenchmarkCase)>();
    let (result_sender, result_receiver) = channel::unbounded::<(usize, RunOutcome)>();
    for work in plan.runs.iter().enumerate() {
        // The receiver is alive until the end of this function
        let _ = work_sender.send(work);
    }
    drop(work_sender);
    let scope_result = crossbeam::scope(|scope| {
        for _ in 0..jobs.min(plan.runs.len()) {
            let work_receiver = work_receiver.clone();
            let result_sender = result_sender.clone();
            scope.spawn(move |_| {
                for (index, case) in work_receiver.iter() {
                    if result_sender.send((index, run_case(case, base_dir))).is_err() {
                        return;
                    }
                }
            });
        }
    });
    if let Err(panic) = scope_result {
        std::panic::resume_unwind(panic);
    }
    drop(result_sender);
    let mut outcomes: Vec<(usize, RunOutcome)> = result_receiver.iter().collect();
    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Writes the completed runs to `all_results.csv` in `output_dir`, creating the directory if needed
///
/// returns: Result<PathBuf, SimulationError>, the path of the written file
pub fn write_results(outcomes: &[RunOutcome], output_dir: &Path) -> Result<PathBuf, SimulationError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(RESULTS_FILE_NAME);
    let rows: Vec<ResultRow> = outcomes
        .iter()
        .filter_map(RunOutcome::report)
        .map(RunReport::row)
        .collect();
    write_csv(File::create(&path)?, &rows, true)?;
    Ok(path)
}
