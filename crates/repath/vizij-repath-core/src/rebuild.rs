//! Rebuild a binding path by walking parent links up to the new root.

use crate::error::RebuildError;
use crate::ids::NodeId;
use crate::scene::SceneQuery;

/// Path of `node` relative to `new_root`, root name excluded.
///
/// Starts from the node's own name and prepends ancestors until the next
/// parent is `new_root`. A node equal to `new_root` yields its own name.
/// Hitting a parentless node first means `node` is not under `new_root`;
/// the walk stops and the partial path is returned inside the error.
pub fn build_path<S: SceneQuery + ?Sized>(
    scene: &S,
    node: NodeId,
    new_root: NodeId,
    max_depth: usize,
) -> Result<String, RebuildError> {
    let Some(name) = scene.name(node) else {
        return Err(RebuildError::OutsideRoot {
            partial: String::new(),
        });
    };
    // leaf first; reversed once at the end
    let mut names = vec![name];
    let mut current = node;
    while current != new_root {
        match scene.parent(current) {
            Some(parent) if parent != new_root => {
                if names.len() > max_depth {
                    return Err(RebuildError::StructuralLoop {
                        partial: join_reversed(&names),
                        max_depth,
                    });
                }
                names.push(scene.name(parent).unwrap_or_default());
                current = parent;
            }
            Some(_) => break,
            None => {
                return Err(RebuildError::OutsideRoot {
                    partial: join_reversed(&names),
                })
            }
        }
    }
    Ok(join_reversed(&names))
}

fn join_reversed(names: &[&str]) -> String {
    let mut parts = names.to_vec();
    parts.reverse();
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{parse_scene_json, SceneGraph};

    fn rig() -> SceneGraph {
        parse_scene_json(
            r#"{ "roots": [
                { "name": "NewRig", "children": [
                    { "name": "Rig", "children": [{ "name": "Arm", "children": [{ "name": "Hand" }] }] },
                    { "name": "Locator" }
                ] },
                { "name": "Stray", "children": [{ "name": "Hand" }] }
            ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn walks_up_to_but_excluding_root() {
        let scene = rig();
        let root = scene.find_by_path("NewRig").unwrap();
        let hand = scene.find_by_path("NewRig/Rig/Arm/Hand").unwrap();
        assert_eq!(build_path(&scene, hand, root, 64).unwrap(), "Rig/Arm/Hand");
        let locator = scene.find_by_path("NewRig/Locator").unwrap();
        assert_eq!(build_path(&scene, locator, root, 64).unwrap(), "Locator");
    }

    #[test]
    fn root_itself_keeps_its_name() {
        let scene = rig();
        let root = scene.find_by_path("NewRig").unwrap();
        assert_eq!(build_path(&scene, root, root, 64).unwrap(), "NewRig");
    }

    #[test]
    fn node_outside_root_reports_partial_path() {
        let scene = rig();
        let root = scene.find_by_path("NewRig").unwrap();
        let stray = scene.find_by_path("Stray/Hand").unwrap();
        assert_eq!(
            build_path(&scene, stray, root, 64),
            Err(RebuildError::OutsideRoot {
                partial: "Stray/Hand".into()
            })
        );
    }

    #[test]
    fn deep_chain_builds_in_one_pass() {
        let mut scene = SceneGraph::new();
        let root = scene.add_root("Root");
        let mut tip = root;
        for _ in 0..50_000 {
            tip = scene.add_child(tip, "b").unwrap();
        }
        let path = build_path(&scene, tip, root, 100_000).unwrap();
        assert_eq!(path.len(), 50_000 * 2 - 1);
        assert!(path.split('/').all(|seg| seg == "b"));
    }

    #[test]
    fn depth_bound_stops_the_walk() {
        let scene = rig();
        let root = scene.find_by_path("NewRig").unwrap();
        let hand = scene.find_by_path("NewRig/Rig/Arm/Hand").unwrap();
        let err = build_path(&scene, hand, root, 1).unwrap_err();
        assert!(matches!(err, RebuildError::StructuralLoop { .. }));
        assert_eq!(err.partial(), "Arm/Hand");
    }
}
