//! Every binding must stay reachable (under its old or its new path) after
//! each individual store write, not just at the end of the batch.

use vizij_repath::{
    apply_plan, error::ClipError, parse_clip_json, parse_scene_json, plan_clear_paths,
    plan_rebind, AnimationClip, ClipStore, CurveBinding, CurveKind, CurvePayload, Keyframe,
    RebindPlan, RebindRequest, RepathConfig, SceneGraph, SkipReason, WriteError,
};

/// Clip store that audits the no-loss invariant after every mutation.
struct AuditingClip {
    inner: AnimationClip,
    expected: Vec<(CurveBinding, CurveBinding, CurvePayload)>,
    mutations: usize,
    /// Writes of a payload to this path are silently dropped.
    refuse: Option<&'static str>,
}

impl AuditingClip {
    fn new(inner: AnimationClip, plan: &RebindPlan) -> Self {
        let mut expected = Vec::new();
        for w in &plan.writes {
            let payload = inner.curve(&w.binding).expect("planned binding exists");
            expected.push((w.binding.clone(), w.target(), payload));
        }
        for s in &plan.skipped {
            let payload = inner.curve(&s.binding).expect("skipped binding exists");
            expected.push((s.binding.clone(), s.binding.clone(), payload));
        }
        Self {
            inner,
            expected,
            mutations: 0,
            refuse: None,
        }
    }

    fn refusing(mut self, path: &'static str) -> Self {
        self.refuse = Some(path);
        self
    }

    fn audit(&self) {
        for (orig, target, payload) in &self.expected {
            let present = [orig, target].iter().any(|k| {
                self.inner
                    .curve(k)
                    .map_or(false, |stored| stored.bit_eq(payload))
            });
            assert!(
                present,
                "after mutation {}: '{}' {} lost (target '{}')",
                self.mutations, orig.path, orig.property_name, target.path
            );
        }
    }
}

impl ClipStore for AuditingClip {
    fn bindings(&self, kind: CurveKind) -> Vec<CurveBinding> {
        self.inner.bindings(kind)
    }

    fn curve(&self, binding: &CurveBinding) -> Option<CurvePayload> {
        self.inner.curve(binding)
    }

    fn set_curve(
        &mut self,
        binding: &CurveBinding,
        payload: Option<CurvePayload>,
    ) -> Result<(), ClipError> {
        if payload.is_some() && self.refuse == Some(binding.path.as_str()) {
            return Ok(());
        }
        self.inner.set_curve(binding, payload)?;
        self.mutations += 1;
        self.audit();
        Ok(())
    }
}

fn key(v: f32) -> CurvePayload {
    CurvePayload::Value(vec![Keyframe {
        time: 0.0,
        value: v,
        in_tangent: 0.0,
        out_tangent: 0.0,
    }])
}

#[test]
fn clear_paths_with_colliding_properties_loses_nothing() {
    let json = vizij_test_fixtures::clips::json("flat").unwrap();
    let clip = parse_clip_json(&json).unwrap();
    let plan = plan_clear_paths(&clip);

    // "Rig/Arm" and "Other/Arm" both animate localPosition.x
    assert_eq!(plan.skipped.len(), 1);
    assert_eq!(plan.skipped[0].binding.path, "Other/Arm");

    let mut audited = AuditingClip::new(clip, &plan);
    let report = apply_plan(&mut audited, &plan, &RepathConfig::default());
    assert_eq!(report.moved.len(), 2);
    assert!(audited.mutations >= 4);
    assert_eq!(audited.inner.len(), 3);
}

/// Global lookup of "Locator" finds R/Rig/Locator, the fill node is R/Locator.
fn locator_chain_scene() -> SceneGraph {
    parse_scene_json(
        r#"{ "roots": [{ "name": "R", "children": [
            { "name": "Rig", "children": [{ "name": "Locator" }] },
            { "name": "Locator" }
        ] }] }"#,
    )
    .unwrap()
}

#[test]
fn fill_node_chain_moves_holder_out_first() {
    let scene = locator_chain_scene();
    let root = scene.find_by_path("R").unwrap();
    let fill = scene.find_by_path("R/Locator").unwrap();

    let on_root = CurveBinding::new("", "localPosition.x", CurveKind::Value);
    let on_locator = CurveBinding::new("Locator", "localPosition.x", CurveKind::Value);
    let clip = AnimationClip::new("chain")
        .with_curve(on_root.clone(), key(1.0))
        .with_curve(on_locator.clone(), key(2.0));

    let request = RebindRequest::new(root).with_fill(fill);
    let plan = plan_rebind(
        &clip,
        &scene,
        &request,
        CurveKind::Value,
        &RepathConfig::default(),
    )
    .unwrap();
    assert!(plan.skipped.is_empty());
    assert_eq!(plan.writes[0].binding, on_locator);
    assert_eq!(plan.writes[0].new_path, "Rig/Locator");
    assert_eq!(plan.writes[1].binding, on_root);
    assert_eq!(plan.writes[1].new_path, "Locator");

    let mut audited = AuditingClip::new(clip, &plan);
    let report = apply_plan(&mut audited, &plan, &RepathConfig::default());
    assert_eq!(report.moved.len(), 2);
    assert_eq!(audited.inner.curve(&on_locator), Some(key(1.0)));
    assert_eq!(
        audited.inner.curve(&on_locator.with_path("Rig/Locator")),
        Some(key(2.0))
    );
    assert!(audited.inner.curve(&on_root).is_none());
}

#[test]
fn move_onto_a_key_that_stays_is_refused() {
    // "" -> "Locator" would overwrite a binding whose leaf cannot be resolved
    let scene =
        parse_scene_json(r#"{ "roots": [{ "name": "R", "children": [{ "name": "Locator" }] }] }"#)
            .unwrap();
    let root = scene.find_by_path("R").unwrap();
    let fill = scene.find_by_path("R/Locator").unwrap();
    let stays = CurveBinding::new("Locator", "localPosition.x", CurveKind::Value);
    let clip = AnimationClip::new("c")
        .with_curve(CurveBinding::new("", "localPosition.x", CurveKind::Value), key(1.0))
        .with_curve(stays.clone(), key(2.0));

    let plan = plan_rebind(
        &clip,
        &scene,
        &RebindRequest::new(root).with_fill(fill),
        CurveKind::Value,
        &RepathConfig::default(),
    )
    .unwrap();
    // "Locator" resolves to itself and claims its key first
    assert_eq!(plan.moves().count(), 0);
    assert!(matches!(
        plan.skipped[0].reason,
        SkipReason::PathCollision { .. }
    ));

    let mut audited = AuditingClip::new(clip, &plan);
    apply_plan(&mut audited, &plan, &RepathConfig::default());
    assert_eq!(audited.inner.curve(&stays), Some(key(2.0)));
}

#[test]
fn failed_move_keeps_its_key_from_the_next_move_in_the_chain() {
    let scene = locator_chain_scene();
    let root = scene.find_by_path("R").unwrap();
    let fill = scene.find_by_path("R/Locator").unwrap();

    let on_root = CurveBinding::new("", "localPosition.x", CurveKind::Value);
    let on_locator = CurveBinding::new("Locator", "localPosition.x", CurveKind::Value);
    let clip = AnimationClip::new("chain")
        .with_curve(on_root.clone(), key(1.0))
        .with_curve(on_locator.clone(), key(2.0));
    let plan = plan_rebind(
        &clip,
        &scene,
        &RebindRequest::new(root).with_fill(fill),
        CurveKind::Value,
        &RepathConfig::default(),
    )
    .unwrap();
    assert_eq!(plan.moves().count(), 2);

    let mut audited = AuditingClip::new(clip, &plan).refusing("Rig/Locator");
    let report = apply_plan(&mut audited, &plan, &RepathConfig::default());
    assert!(report.moved.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(matches!(
        report.failed[0].error,
        WriteError::Unverified { .. }
    ));
    assert!(matches!(
        report.failed[1].error,
        WriteError::TargetOccupied { .. }
    ));
    assert_eq!(audited.inner.curve(&on_root), Some(key(1.0)));
    assert_eq!(audited.inner.curve(&on_locator), Some(key(2.0)));
    assert_eq!(audited.inner.len(), 2);
}
