use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use studycore_config::GameConfig;
use studycore_types::Task;

/// Builds the session's task list in the order the config prescribes
/// (declaration order if `game.tasks.ordered`, otherwise a random
/// shuffle), with each task's `start_time`/`end_time` laid out back to
/// back starting at `session_start`.
pub fn build_initial_tasks(config: &GameConfig, session_start: DateTime<Utc>) -> Vec<Task> {
    let mut order: Vec<usize> = (0..config.tasks_in_order().len()).collect();
    if !config.tasks_meta.ordered {
        order.shuffle(&mut rand::thread_rng());
    }

    let mut tasks = Vec::with_capacity(order.len());
    let mut cursor = session_start;
    for (position, idx) in order.into_iter().enumerate() {
        let task_cfg = &config.tasks_in_order()[idx];
        let timer = config.task_timer(task_cfg);
        let end = cursor + Duration::milliseconds((timer * 1000.0) as i64);
        tasks.push(Task {
            task_id: task_cfg.id.clone(),
            task_order: position,
            description: task_cfg.description.clone(),
            start_time: cursor,
            end_time: end,
            is_completed: false,
            is_aborted: false,
            is_timed_out: false,
            completion_time: None,
            aborted_reason: None,
            duration: None,
            interaction_times: 0,
        });
        cursor = end;
    }
    tasks
}

/// A task just became terminal at `actual_end`. If that happened before
/// or after its configured `end_time`, shift every later task's window by
/// the same delta so the whole remaining schedule stays contiguous
/// (the re-timing cascade).
pub fn retime_following(tasks: &mut [Task], finished_index: usize, actual_end: DateTime<Utc>) {
    let configured_end = tasks[finished_index].end_time;
    let delta = actual_end - configured_end;
    if delta == Duration::zero() {
        return;
    }
    for task in tasks.iter_mut().skip(finished_index + 1) {
        task.start_time += delta;
        task.end_time += delta;
    }
}

/// The task whose window contains `now`, if any — the scheduler's
/// definition of "current task" (spec.md §3).
pub fn current_task(tasks: &[Task], now: DateTime<Utc>) -> Option<&Task> {
    tasks.iter().find(|t| t.is_current_at(now))
}

/// Goal-checker-triggered completion (spec.md §4.3, "Completion"). Duration
/// and the cascade must both be computed against the task's *scheduled*
/// `end_time`, before it's overwritten with `now` — otherwise the delta
/// `retime_following` shifts later tasks by always comes out zero.
pub fn complete_task(tasks: &mut [Task], idx: usize, now: DateTime<Utc>) {
    tasks[idx].is_completed = true;
    tasks[idx].duration = Some((now - tasks[idx].start_time).num_milliseconds() as f64 / 1000.0);
    retime_following(tasks, idx, now);
    tasks[idx].completion_time = Some(now);
    tasks[idx].end_time = now;
}

/// Client-initiated abort (spec.md §4.3, "Abort").
pub fn abort_task(tasks: &mut [Task], idx: usize, now: DateTime<Utc>, reason: String) {
    tasks[idx].is_aborted = true;
    tasks[idx].aborted_reason = Some(reason);
    tasks[idx].duration = Some((now - tasks[idx].start_time).num_milliseconds() as f64 / 1000.0);
    retime_following(tasks, idx, now);
    tasks[idx].completion_time = Some(now);
    tasks[idx].end_time = now;
}

/// Lazily reconciles timeouts: any non-terminal task whose configured
/// window has fully elapsed is marked timed out and the cascade applied.
/// Called at the top of every command the executor processes rather than
/// on a dedicated timer, since a session with no activity for a while
/// should still report consistent state the next time it's touched.
/// Returns the indices that just transitioned, in ascending order, so the
/// caller can log `TASK_TIMEOUT`/`TASK_BEGIN` and apply the next task's
/// `defaultDeviceProperties` for each.
///
/// A timed-out task keeps its full configured duration (the participant
/// used the whole window, however late reconciliation happened to catch
/// it), but the cascade into later tasks runs against `now`: whoever
/// reconnects after being gone resumes the schedule from the moment they
/// come back, not from whenever the timer technically lapsed (spec.md §8,
/// "Timeout cascade").
pub fn reconcile_timeouts(tasks: &mut Vec<Task>, now: DateTime<Utc>) -> Vec<usize> {
    let mut timed_out = Vec::new();
    let mut i = 0;
    while i < tasks.len() {
        let expired = !tasks[i].is_terminal() && tasks[i].end_time < now;
        if expired {
            tasks[i].is_timed_out = true;
            tasks[i].duration = Some(tasks[i].configured_duration().num_milliseconds() as f64 / 1000.0);
            retime_following(tasks, i, now);
            tasks[i].completion_time = Some(now);
            tasks[i].end_time = now;
            timed_out.push(i);
        }
        i += 1;
    }
    timed_out
}
