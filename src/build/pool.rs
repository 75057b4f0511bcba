//! Bounded compile worker pool.
//!
//! Planning stays single-threaded; only compile tasks fan out. The
//! coordinator feeds a bounded queue, workers drain it until the queue
//! closes, and results come back over an unbounded channel. On the first
//! failure the coordinator stops submitting, closes the queue, and waits for
//! the in-flight tasks to report before returning the error; running
//! compilers are never interrupted.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use indicatif::ProgressBar;

use super::utils::{run_captured, write_dep_record};
use crate::errors::BuildError;
use crate::includes::extract_includes;

/// One synthesized compile invocation.
#[derive(Debug, Clone)]
pub struct CompileTask {
    pub source: PathBuf,
    pub object: PathBuf,
    pub command: Vec<String>,
}

/// Run every task, in submission order when sequential. Parallel execution
/// may reorder completion, but callers keep their object lists in source
/// order independently of this function.
pub fn run_compile_tasks(
    tasks: &[CompileTask],
    parallel: bool,
    progress: Option<&ProgressBar>,
) -> Result<(), BuildError> {
    if !parallel || tasks.len() < 2 {
        for task in tasks {
            run_compile(task)?;
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }
        return Ok(());
    }

    let workers = tasks.len().min(
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    );
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| BuildError::Pool(e.to_string()))?;

    let (task_tx, task_rx) = mpsc::sync_channel::<&CompileTask>(workers);
    let task_rx = Arc::new(Mutex::new(task_rx));
    let (result_tx, result_rx) = mpsc::channel::<Result<(), BuildError>>();

    let mut first_error: Option<BuildError> = None;
    pool.in_place_scope(|scope| {
        for _ in 0..workers {
            let task_rx = Arc::clone(&task_rx);
            let result_tx = result_tx.clone();
            scope.spawn(move |_| {
                loop {
                    // A closed queue is the stop signal.
                    let task = { task_rx.lock().expect("task queue lock").recv() };
                    let Ok(task) = task else { break };
                    let result = run_compile(task);
                    if let Some(pb) = progress {
                        pb.inc(1);
                    }
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut submitted = 0usize;
        let mut received = 0usize;
        for task in tasks {
            while let Ok(result) = result_rx.try_recv() {
                received += 1;
                note_failure(result, &mut first_error);
            }
            if first_error.is_some() {
                break;
            }
            if task_tx.send(task).is_err() {
                break;
            }
            submitted += 1;
        }
        drop(task_tx);

        while received < submitted {
            match result_rx.recv() {
                Ok(result) => {
                    received += 1;
                    note_failure(result, &mut first_error);
                }
                Err(_) => break,
            }
        }
    });

    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn note_failure(result: Result<(), BuildError>, first_error: &mut Option<BuildError>) {
    if let Err(error) = result {
        if first_error.is_none() {
            *first_error = Some(error);
        }
    }
}

/// Run one compile and, on success, record its include dependencies next to
/// the object file.
fn run_compile(task: &CompileTask) -> Result<(), BuildError> {
    let result = run_captured(&task.command);
    if !result.success {
        return Err(BuildError::Compile {
            unit: task.source.display().to_string(),
            command: task.command.join(" "),
            output: result.output,
        });
    }
    write_dep_record(&task.object, &task.source, &extract_includes(&task.source))?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cforge_pool_{}_{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn task(dir: &Path, name: &str, command: &[&str]) -> CompileTask {
        CompileTask {
            source: dir.join(format!("{name}.cpp")),
            object: dir.join(format!("{name}.o")),
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn successful_tasks_write_dep_records() {
        let dir = scratch_dir("ok");
        let tasks = vec![task(&dir, "a", &["true"]), task(&dir, "b", &["true"])];
        run_compile_tasks(&tasks, true, None).unwrap();
        assert!(dir.join("a.d").exists());
        assert!(dir.join("b.d").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn failing_task_surfaces_command_and_halts() {
        let dir = scratch_dir("fail");
        let mut tasks = vec![task(&dir, "bad", &["false"])];
        for i in 0..6 {
            tasks.push(task(&dir, &format!("ok{i}"), &["true"]));
        }
        let err = run_compile_tasks(&tasks, true, None).unwrap_err();
        match err {
            BuildError::Compile { command, .. } => assert_eq!(command, "false"),
            other => panic!("unexpected error: {other}"),
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn sequential_mode_preserves_submission_order() {
        let dir = scratch_dir("seq");
        let log = dir.join("order.txt");
        let tasks: Vec<CompileTask> = (0..3)
            .map(|i| {
                task(
                    &dir,
                    &format!("t{i}"),
                    &["sh", "-c", &format!("echo {i} >> {}", log.display())],
                )
            })
            .collect();
        run_compile_tasks(&tasks, false, None).unwrap();
        assert_eq!(fs::read_to_string(&log).unwrap(), "0\n1\n2\n");
        fs::remove_dir_all(&dir).ok();
    }
}
