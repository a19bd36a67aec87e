use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use polynav::{AIEntity, AIWorld, NavMesh, NavMeshConfig, NavMeshGenerator, SharedNavMesh};
use polynav_common::{Error, Result};
use polynav_path::PathfindingAStar;
use web_time::Instant;

use crate::PathRequest;

/// Cycles shorter than this are measured again after a short sleep: very
/// small durations are imprecise on some platforms
const MIN_MEASURABLE_CYCLE: Duration = Duration::from_micros(250);
const MEASURE_SLEEP: Duration = Duration::from_millis(2);

/// Longest sleep before checking the stop flag again
const SLEEP_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct ControlState {
    paused: bool,
    path_requests: Vec<Arc<PathRequest>>,
}

/// State shared between the environment handle and the AI thread
#[derive(Debug)]
struct AIContext {
    control: Mutex<ControlState>,
    world: Mutex<AIWorld>,
    generator: Mutex<NavMeshGenerator>,
    nav_mesh: SharedNavMesh,
    stopper: AtomicBool,
    fault: Mutex<Option<String>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| Error::Thread(format!("{name} lock poisoned")))
}

impl AIContext {
    fn process_ai_update(&self) -> Result<()> {
        let (paused, path_requests) = {
            let control = lock(&self.control, "control")?;
            (control.paused, control.path_requests.clone())
        };
        if paused {
            return Ok(());
        }

        let mut world = lock(&self.world, "world")?.snapshot();
        let (nav_mesh, jump_penalty) = {
            let mut generator = lock(&self.generator, "generator")?;
            let nav_mesh = generator.generate(&mut world)?;
            (nav_mesh, generator.config().jump_penalty)
        };

        let pathfinding = PathfindingAStar::new(nav_mesh, jump_penalty);
        for path_request in &path_requests {
            let path = pathfinding
                .find_path(path_request.start_point(), path_request.end_point())
                .unwrap_or_else(|error| {
                    log::debug!("Path request resolved with an empty path: {error}");
                    Vec::new()
                });
            path_request.set_path(path);
        }
        Ok(())
    }

    fn continue_execution(&self) -> bool {
        !self.stopper.load(Ordering::Acquire)
    }

    fn start_ai_update(&self, time_step: Duration) {
        let mut frame_start_time = Instant::now();

        while self.continue_execution() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process_ai_update()));
            let fault = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(error)) => Some(error.to_string()),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };
            if let Some(fault) = fault {
                log::error!("Error cause AI thread crash: exception reported to main thread: {fault}");
                *self.fault.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(fault);
                return;
            }

            let mut frame_end_time = Instant::now();
            let mut delta_time = frame_end_time.duration_since(frame_start_time);
            if delta_time < MIN_MEASURABLE_CYCLE {
                thread::sleep(MEASURE_SLEEP);
                frame_end_time = Instant::now();
                delta_time = frame_end_time.duration_since(frame_start_time);
            }

            match time_step.checked_sub(delta_time) {
                Some(remaining_time) => {
                    if self.step_sleep(remaining_time) {
                        break;
                    }
                    frame_start_time = Instant::now();
                }
                None => frame_start_time = frame_end_time,
            }
        }

        log::info!("AI thread stopped");
    }

    /// Sleeps by slices, returns true when the thread is asked to stop
    fn step_sleep(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if !self.continue_execution() {
                return true;
            }
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
        !self.continue_execution()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic with unknown payload".to_string()
    }
}

/// AI subsystem entry point: owns the world, the navigation mesh generator
/// and the background thread refreshing the navigation mesh and the path
/// requests.
///
/// The environment starts paused. Dropping it stops and joins the thread.
#[derive(Debug)]
pub struct AIEnvironment {
    context: Arc<AIContext>,
    ai_thread: Option<JoinHandle<()>>,
}

impl AIEnvironment {
    pub fn new(config: NavMeshConfig) -> Result<Self> {
        let generator = NavMeshGenerator::new(config)?;
        let nav_mesh = generator.shared_nav_mesh();
        Ok(Self {
            context: Arc::new(AIContext {
                control: Mutex::new(ControlState {
                    paused: true,
                    path_requests: Vec::new(),
                }),
                world: Mutex::new(AIWorld::new()),
                generator: Mutex::new(generator),
                nav_mesh,
                stopper: AtomicBool::new(false),
                fault: Mutex::new(None),
            }),
            ai_thread: None,
        })
    }

    pub fn config(&self) -> Result<NavMeshConfig> {
        Ok(lock(&self.context.generator, "generator")?.config().clone())
    }

    /// Replaces the generator configuration; the next cycle rebuilds the
    /// whole navigation mesh
    pub fn set_config(&self, config: NavMeshConfig) -> Result<()> {
        lock(&self.context.generator, "generator")?.set_config(config)
    }

    pub fn add_entity(&self, entity: Arc<AIEntity>) -> Result<()> {
        lock(&self.context.world, "world")?.add_entity(entity);
        Ok(())
    }

    /// Returns false when the entity was not in the environment
    pub fn remove_entity(&self, entity: &Arc<AIEntity>) -> Result<bool> {
        Ok(lock(&self.context.world, "world")?.remove_entity(entity))
    }

    pub fn add_path_request(&self, path_request: Arc<PathRequest>) -> Result<()> {
        lock(&self.context.control, "control")?
            .path_requests
            .push(path_request);
        Ok(())
    }

    /// Returns false when the request was not registered
    pub fn remove_path_request(&self, path_request: &Arc<PathRequest>) -> Result<bool> {
        let mut control = lock(&self.context.control, "control")?;
        match control
            .path_requests
            .iter()
            .position(|request| Arc::ptr_eq(request, path_request))
        {
            Some(index) => {
                control.path_requests.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Starts the AI thread, updating every `time_step` seconds
    pub fn set_up(&mut self, time_step: f32) -> Result<()> {
        if self.ai_thread.is_some() {
            return Err(Error::Configuration("AI thread is already started".to_string()));
        }
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(Error::Configuration(format!("invalid AI time step: {time_step}")));
        }

        let context = Arc::clone(&self.context);
        let time_step = Duration::from_secs_f32(time_step);
        let ai_thread = thread::Builder::new()
            .name("polynav-ai".to_string())
            .spawn(move || context.start_ai_update(time_step))?;
        self.ai_thread = Some(ai_thread);
        log::info!("AI thread started with a time step of {:?}", time_step);
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        lock(&self.context.control, "control")?.paused = true;
        Ok(())
    }

    pub fn unpause(&self) -> Result<()> {
        lock(&self.context.control, "control")?.paused = false;
        Ok(())
    }

    pub fn is_paused(&self) -> Result<bool> {
        Ok(lock(&self.context.control, "control")?.paused)
    }

    /// Runs one AI cycle on the calling thread
    pub fn update(&self) -> Result<()> {
        self.context.process_ai_update()
    }

    /// Last published navigation mesh, `None` before the first generation
    pub fn nav_mesh(&self) -> Option<Arc<NavMesh>> {
        let nav_mesh: Arc<NavMesh> = self.context.nav_mesh.load();
        (nav_mesh.update_id() > 0).then_some(nav_mesh)
    }

    /// Stops the AI thread after its current cycle and waits for it
    pub fn interrupt_thread(&mut self) {
        self.context.stopper.store(true, Ordering::Release);
        if let Some(ai_thread) = self.ai_thread.take() {
            if ai_thread.join().is_err() {
                log::error!("AI thread terminated abnormally");
            }
        }
    }

    /// Re-raises on the calling thread the error which stopped the AI
    /// thread
    pub fn check_no_exception_raised(&self) -> Result<()> {
        match self
            .context
            .fault
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            Some(fault) => Err(Error::Thread(fault.clone())),
            None => Ok(()),
        }
    }
}

impl Drop for AIEnvironment {
    fn drop(&mut self) {
        self.interrupt_thread();
    }
}
