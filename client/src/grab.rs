//! Attaching pointers to shared objects.

use presence_shared::frame::{ObjectPose, Transform};
use presence_shared::vec3::distance;

use crate::pointer::PointerState;
use crate::registry::EntityRegistry;

/// Nearest object strictly within `threshold` of pointer `index` that no
/// other pointer is holding.
pub fn find_grab_target(
    pointers: &[PointerState],
    index: usize,
    registry: &EntityRegistry,
    threshold: f32,
) -> Option<u32> {
    let origin = pointers.get(index)?.position();
    let held_elsewhere = |id: u32| {
        pointers
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && p.grabbed_object_id == Some(id))
    };

    registry
        .objects()
        .iter()
        .filter(|o| !held_elsewhere(o.id))
        .map(|o| (o.id, distance(o.latest_pose.position, origin)))
        .filter(|(_, d)| *d < threshold)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Handle a grab press. Returns the newly held object, if any.
pub fn grab(
    pointers: &mut [PointerState],
    index: usize,
    registry: &EntityRegistry,
    threshold: f32,
) -> Option<u32> {
    if pointers.get(index)?.grabbed_object_id.is_some() {
        return None;
    }
    let target = find_grab_target(pointers, index, registry, threshold)?;
    pointers[index].grabbed_object_id = Some(target);
    tracing::debug!("Pointer {} grabbed object {}", index, target);
    Some(target)
}

/// Handle a grab release. The object stays where it was last placed.
pub fn release(pointer: &mut PointerState) -> Option<u32> {
    pointer.grabbed_object_id.take()
}

/// Outcome of carrying for one pointer this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Carry {
    /// Nothing held.
    Idle,
    /// The held object moved onto the pointer; publish this pose.
    Moved { id: u32, pose: ObjectPose },
    /// The held object disappeared from the registry and was let go.
    Lost(u32),
}

/// Move the held object onto the pointer.
pub fn carry(pointer: &mut PointerState, registry: &mut EntityRegistry) -> Carry {
    let Some(id) = pointer.grabbed_object_id else {
        return Carry::Idle;
    };
    let Some(object) = registry.find_object_mut(id) else {
        tracing::debug!("Held object {} is gone, releasing", id);
        pointer.grabbed_object_id = None;
        return Carry::Lost(id);
    };
    object.latest_pose = Transform {
        position: pointer.input.position(),
        orientation: pointer.input.orientation,
    };
    Carry::Moved {
        id,
        pose: object.latest_pose,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::PointerInput;
    use crate::surface::Ray;
    use presence_shared::vec3::{vec3, Quat, Vec3};

    fn pointer_at(p: Vec3) -> PointerState {
        PointerState {
            input: PointerInput {
                ray: Ray::new(p, vec3(0.0, 0.0, -1.0)),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn registry_with(objects: &[(u32, Vec3)]) -> EntityRegistry {
        let mut reg = EntityRegistry::new(4);
        for (id, pos) in objects {
            reg.add_object(*id);
            reg.find_object_mut(*id).unwrap().latest_pose.position = *pos;
        }
        reg
    }

    #[test]
    fn object_just_inside_threshold_is_grabbed() {
        let reg = registry_with(&[(1, vec3(0.09, 0.0, 0.0))]);
        let mut pointers = [pointer_at(Vec3::ZERO), pointer_at(vec3(5.0, 0.0, 0.0))];
        assert_eq!(grab(&mut pointers, 0, &reg, 0.1), Some(1));
        assert_eq!(pointers[0].grabbed_object_id, Some(1));
    }

    #[test]
    fn object_just_outside_threshold_is_not_grabbed() {
        let reg = registry_with(&[(1, vec3(0.11, 0.0, 0.0))]);
        let mut pointers = [pointer_at(Vec3::ZERO), pointer_at(vec3(5.0, 0.0, 0.0))];
        assert_eq!(grab(&mut pointers, 0, &reg, 0.1), None);
        assert_eq!(pointers[0].grabbed_object_id, None);
    }

    #[test]
    fn nearest_object_wins() {
        let reg = registry_with(&[(1, vec3(0.08, 0.0, 0.0)), (2, vec3(0.0, 0.03, 0.0))]);
        let mut pointers = [pointer_at(Vec3::ZERO), pointer_at(vec3(5.0, 0.0, 0.0))];
        assert_eq!(grab(&mut pointers, 0, &reg, 0.1), Some(2));
    }

    #[test]
    fn object_held_by_other_pointer_is_skipped() {
        let reg = registry_with(&[(1, vec3(0.0, 0.0, 0.0))]);
        let mut pointers = [pointer_at(Vec3::ZERO), pointer_at(vec3(0.01, 0.0, 0.0))];
        assert_eq!(grab(&mut pointers, 0, &reg, 0.1), Some(1));
        assert_eq!(grab(&mut pointers, 1, &reg, 0.1), None);
    }

    #[test]
    fn pointer_holds_one_object_at_a_time() {
        let reg = registry_with(&[(1, vec3(0.0, 0.0, 0.0)), (2, vec3(0.01, 0.0, 0.0))]);
        let mut pointers = [pointer_at(Vec3::ZERO), pointer_at(vec3(5.0, 0.0, 0.0))];
        assert_eq!(grab(&mut pointers, 0, &reg, 0.1), Some(1));
        assert_eq!(grab(&mut pointers, 0, &reg, 0.1), None);
        assert_eq!(pointers[0].grabbed_object_id, Some(1));
    }

    #[test]
    fn carry_moves_object_to_pointer() {
        let mut reg = registry_with(&[(1, vec3(0.0, 0.0, 0.0))]);
        let mut pointer = pointer_at(Vec3::ZERO);
        pointer.grabbed_object_id = Some(1);
        pointer.input.ray.origin = vec3(0.5, 1.0, -0.2);
        pointer.input.orientation = Quat::new(0.0, 1.0, 0.0, 0.0);

        let Carry::Moved { id, pose } = carry(&mut pointer, &mut reg) else {
            panic!("expected the object to move");
        };
        assert_eq!(id, 1);
        assert_eq!(pose.position, vec3(0.5, 1.0, -0.2));
        assert_eq!(reg.find_object(1).unwrap().latest_pose, pose);
    }

    #[test]
    fn release_leaves_object_in_place() {
        let mut reg = registry_with(&[(1, vec3(0.0, 0.0, 0.0))]);
        let mut pointer = pointer_at(vec3(0.3, 0.3, 0.3));
        pointer.grabbed_object_id = Some(1);
        carry(&mut pointer, &mut reg);
        assert_eq!(release(&mut pointer), Some(1));
        pointer.input.ray.origin = vec3(9.0, 9.0, 9.0);
        assert_eq!(carry(&mut pointer, &mut reg), Carry::Idle);
        assert_eq!(
            reg.find_object(1).unwrap().latest_pose.position,
            vec3(0.3, 0.3, 0.3)
        );
    }

    #[test]
    fn removed_object_is_let_go() {
        let mut reg = registry_with(&[(1, vec3(0.0, 0.0, 0.0))]);
        let mut pointer = pointer_at(Vec3::ZERO);
        pointer.grabbed_object_id = Some(1);
        reg.remove_object(1);
        assert_eq!(carry(&mut pointer, &mut reg), Carry::Lost(1));
        assert_eq!(pointer.grabbed_object_id, None);
        assert_eq!(carry(&mut pointer, &mut reg), Carry::Idle);
    }
}
