//! Environment cycles, synchronous and on the AI thread

use crate::{AIEnvironment, PathRequest};
use glam::{Quat, Vec3};
use polynav::{AIEntity, AIShape, NavMeshAgent, NavMeshConfig, ObjectShape, Transform};
use polynav_common::{Error, Result};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn environment() -> AIEnvironment {
    init_logger();
    AIEnvironment::new(NavMeshConfig::new(NavMeshAgent::new(2.0, 0.0))).unwrap()
}

fn ground(name: &str, position: Vec3) -> Arc<AIEntity> {
    Arc::new(AIEntity::new_object(
        name,
        Transform::from_position(position),
        true,
        vec![ObjectShape::new(AIShape::Box {
            half_sizes: Vec3::new(4.0, 0.01, 4.0),
        })],
    ))
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[cfg(test)]
mod synchronous_update_tests {
    use super::*;

    #[test]
    fn test_paused_by_default() -> Result<()> {
        let environment = environment();
        environment.add_entity(ground("ground", Vec3::ZERO))?;
        let request = Arc::new(PathRequest::new(Vec3::new(-1.0, 0.01, -1.0), Vec3::new(1.0, 0.01, 1.0)));
        environment.add_path_request(Arc::clone(&request))?;

        assert!(environment.is_paused()?);
        environment.update()?;

        assert!(environment.nav_mesh().is_none());
        assert!(!request.is_path_ready());
        Ok(())
    }

    #[test]
    fn test_update_resolves_path_requests() -> Result<()> {
        let environment = environment();
        environment.add_entity(ground("ground", Vec3::ZERO))?;
        let start = Vec3::new(-1.0, 0.01, -2.0);
        let end = Vec3::new(1.0, 0.01, 2.5);
        let request = Arc::new(PathRequest::new(start, end));
        let outside_request = Arc::new(PathRequest::new(start, Vec3::new(50.0, 0.0, 0.0)));
        environment.add_path_request(Arc::clone(&request))?;
        environment.add_path_request(Arc::clone(&outside_request))?;

        environment.unpause()?;
        environment.update()?;

        let nav_mesh = environment.nav_mesh().expect("navigation mesh generated");
        assert_eq!(nav_mesh.update_id(), 1);
        assert_eq!(nav_mesh.polygons().len(), 1);

        assert!(request.is_path_ready());
        let path = request.path();
        assert_eq!(path.len(), 2);
        assert!(path[0].point.distance(start) < 1e-4);
        assert!(path[1].point.distance(end) < 1e-4);

        assert!(outside_request.is_path_ready());
        assert!(outside_request.path().is_empty());
        Ok(())
    }

    #[test]
    fn test_remove_path_request() -> Result<()> {
        let environment = environment();
        environment.add_entity(ground("ground", Vec3::ZERO))?;
        let request = Arc::new(PathRequest::new(Vec3::new(0.5, 0.0, -1.5), Vec3::new(1.0, 0.0, 2.5)));
        environment.add_path_request(Arc::clone(&request))?;

        assert!(environment.remove_path_request(&request)?);
        assert!(!environment.remove_path_request(&request)?);
        environment.unpause()?;
        environment.update()?;

        assert!(!request.is_path_ready());
        Ok(())
    }

    #[test]
    fn test_removed_entity_leaves_nav_mesh() -> Result<()> {
        let environment = environment();
        let left = ground("left", Vec3::ZERO);
        let right = ground("right", Vec3::new(20.0, 0.0, 0.0));
        environment.add_entity(Arc::clone(&left))?;
        environment.add_entity(Arc::clone(&right))?;
        environment.unpause()?;
        environment.update()?;
        assert_eq!(environment.nav_mesh().map(|m| m.polygons().len()), Some(2));

        assert!(environment.remove_entity(&right)?);
        environment.update()?;

        let nav_mesh = environment.nav_mesh().expect("navigation mesh generated");
        assert_eq!(nav_mesh.update_id(), 2);
        assert_eq!(nav_mesh.polygons().len(), 1);
        assert_eq!(nav_mesh.polygons()[0].name(), "<left[2]>");
        Ok(())
    }

    #[test]
    fn test_unsupported_shape_fails_update() -> Result<()> {
        let environment = environment();
        environment.add_entity(Arc::new(AIEntity::new_object(
            "mesh",
            Transform::default(),
            true,
            vec![ObjectShape::new(AIShape::Unsupported {
                type_name: "HeightfieldMesh".to_string(),
            })],
        )))?;
        environment.unpause()?;

        assert!(matches!(environment.update(), Err(Error::Configuration(_))));
        assert!(environment.nav_mesh().is_none());
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        init_logger();
        let config = NavMeshConfig::new(NavMeshAgent::new(0.0, 0.5));
        assert!(matches!(AIEnvironment::new(config), Err(Error::Configuration(_))));

        let environment = environment();
        let invalid = NavMeshConfig::new(NavMeshAgent::new(2.0, -1.0));
        assert!(environment.set_config(invalid).is_err());
        assert_eq!(environment.config().unwrap().agent.agent_radius, 0.0);
    }
}

#[cfg(test)]
mod ai_thread_tests {
    use super::*;

    #[test]
    fn test_set_up_twice() -> Result<()> {
        let mut environment = environment();
        environment.set_up(0.05)?;

        assert!(matches!(environment.set_up(0.05), Err(Error::Configuration(_))));
        environment.interrupt_thread();
        environment.check_no_exception_raised()
    }

    #[test]
    fn test_invalid_time_step() {
        let mut environment = environment();
        assert!(matches!(environment.set_up(0.0), Err(Error::Configuration(_))));
        assert!(matches!(environment.set_up(f32::NAN), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_thread_resolves_path_request() -> Result<()> {
        let mut environment = environment();
        environment.add_entity(ground("ground", Vec3::ZERO))?;
        let request = Arc::new(PathRequest::new(Vec3::new(-2.0, 0.01, 0.0), Vec3::new(2.0, 0.01, 0.0)));
        environment.add_path_request(Arc::clone(&request))?;
        environment.set_up(0.01)?;

        thread::sleep(Duration::from_millis(30));
        assert!(!request.is_path_ready(), "paused environment must not resolve requests");

        environment.unpause()?;
        assert!(wait_until(|| request.is_path_ready()));
        assert_eq!(request.path().len(), 2);

        environment.interrupt_thread();
        environment.check_no_exception_raised()
    }

    #[test]
    fn test_thread_failure_is_reported() -> Result<()> {
        let mut environment = environment();
        environment.add_entity(Arc::new(AIEntity::new_object(
            "mesh",
            Transform::default(),
            true,
            vec![ObjectShape::new(AIShape::Unsupported {
                type_name: "HeightfieldMesh".to_string(),
            })],
        )))?;
        environment.unpause()?;
        environment.set_up(0.01)?;

        assert!(wait_until(|| environment.check_no_exception_raised().is_err()));
        assert!(matches!(environment.check_no_exception_raised(), Err(Error::Thread(_))));
        environment.interrupt_thread();
        Ok(())
    }

    #[test]
    fn test_concurrent_entity_moves() -> Result<()> {
        let mut environment = environment();
        let platform = ground("platform", Vec3::ZERO);
        environment.add_entity(Arc::clone(&platform))?;
        environment.add_entity(ground("floor", Vec3::new(0.0, -10.0, 0.0)))?;
        environment.unpause()?;
        environment.set_up(0.005)?;

        let mover = {
            let platform = Arc::clone(&platform);
            thread::spawn(move || {
                for i in 0..200 {
                    let offset = (i % 10) as f32 * 0.5;
                    platform.update_transform(Vec3::new(offset, 0.0, 0.0), Quat::IDENTITY);
                    thread::sleep(Duration::from_millis(1));
                }
                platform.update_transform(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY);
            })
        };
        mover.join().expect("mover thread");

        // the last transform is picked up by a later cycle
        assert!(wait_until(|| {
            environment.nav_mesh().is_some_and(|nav_mesh| {
                nav_mesh
                    .polygons()
                    .iter()
                    .any(|polygon| polygon.points().iter().any(|point| point.x > 13.9))
            })
        }));

        environment.interrupt_thread();
        environment.check_no_exception_raised()
    }

    #[test]
    fn test_drop_stops_thread() -> Result<()> {
        let mut environment = environment();
        environment.add_entity(ground("ground", Vec3::ZERO))?;
        environment.unpause()?;
        environment.set_up(0.01)?;
        assert!(wait_until(|| environment.nav_mesh().is_some()));
        drop(environment);
        Ok(())
    }
}
