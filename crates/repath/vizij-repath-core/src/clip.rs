//! Curve bindings, payloads and the clip store seam.
//!
//! A clip is a table of `(path, property, kind) -> payload`. Hosts expose their
//! own clip storage through [`ClipStore`]; [`AnimationClip`] is the in-memory
//! implementation, ordered by insertion like the engine's binding arrays.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ClipError;

/// Value curves hold numeric keys; object-reference curves hold object keys.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurveKind {
    Value,
    ObjectReference,
}

/// Association between a hierarchy path + property name and a curve.
/// `path` is empty for properties on the root itself.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveBinding {
    pub path: String,
    pub property_name: String,
    pub kind: CurveKind,
}

impl CurveBinding {
    pub fn new(path: impl Into<String>, property_name: impl Into<String>, kind: CurveKind) -> Self {
        Self {
            path: path.into(),
            property_name: property_name.into(),
            kind,
        }
    }

    /// Same property and kind, retargeted at `path`.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            property_name: self.property_name.clone(),
            kind: self.kind,
        }
    }
}

/// Empty, or slash-separated non-empty segments without leading/trailing slash.
pub fn is_well_formed_path(path: &str) -> bool {
    path.is_empty() || path.split('/').all(|seg| !seg.is_empty())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectKeyframe {
    pub time: f32,
    /// Asset reference (GUID or asset path); `None` is an explicit null key.
    pub object: Option<String>,
}

/// Curve data carried through a rebind untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurvePayload {
    Value(Vec<Keyframe>),
    ObjectReference(Vec<ObjectKeyframe>),
}

impl CurvePayload {
    #[inline]
    pub fn kind(&self) -> CurveKind {
        match self {
            CurvePayload::Value(_) => CurveKind::Value,
            CurvePayload::ObjectReference(_) => CurveKind::ObjectReference,
        }
    }

    pub fn key_count(&self) -> usize {
        match self {
            CurvePayload::Value(keys) => keys.len(),
            CurvePayload::ObjectReference(keys) => keys.len(),
        }
    }

    /// Bitwise equality: NaN keys compare equal to themselves, -0.0 != 0.0.
    pub fn bit_eq(&self, other: &CurvePayload) -> bool {
        fn f(a: f32, b: f32) -> bool {
            a.to_bits() == b.to_bits()
        }
        match (self, other) {
            (CurvePayload::Value(a), CurvePayload::Value(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| {
                        f(x.time, y.time)
                            && f(x.value, y.value)
                            && f(x.in_tangent, y.in_tangent)
                            && f(x.out_tangent, y.out_tangent)
                    })
            }
            (CurvePayload::ObjectReference(a), CurvePayload::ObjectReference(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|(x, y)| f(x.time, y.time) && x.object == y.object)
            }
            _ => false,
        }
    }
}

/// Clip storage as the rebind pipeline consumes it.
pub trait ClipStore {
    /// Stable snapshot of all bindings of `kind`, in store order.
    fn bindings(&self, kind: CurveKind) -> Vec<CurveBinding>;
    fn curve(&self, binding: &CurveBinding) -> Option<CurvePayload>;
    /// Insert/overwrite the curve at `binding`; `None` deletes it.
    fn set_curve(
        &mut self,
        binding: &CurveBinding,
        payload: Option<CurvePayload>,
    ) -> Result<(), ClipError>;
}

/// In-memory clip keyed by binding, iteration order = insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    curves: IndexMap<CurveBinding, CurvePayload>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            curves: IndexMap::new(),
        }
    }

    /// Builder-style insert; panics on kind mismatch (test/tooling helper).
    pub fn with_curve(mut self, binding: CurveBinding, payload: CurvePayload) -> Self {
        self.insert(binding, payload)
            .unwrap_or_else(|e| panic!("with_curve: {e}"));
        self
    }

    pub fn insert(
        &mut self,
        binding: CurveBinding,
        payload: CurvePayload,
    ) -> Result<(), ClipError> {
        self.set_curve(&binding, Some(payload))
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurveBinding, &CurvePayload)> {
        self.curves.iter()
    }

    pub fn to_document(&self) -> ClipDocument {
        ClipDocument {
            name: self.name.clone(),
            curves: self
                .curves
                .iter()
                .map(|(b, p)| CurveDocument::from_parts(b, p))
                .collect(),
        }
    }

    pub fn from_document(doc: ClipDocument) -> Result<Self, ClipError> {
        let mut clip = AnimationClip::new(doc.name);
        for c in doc.curves {
            let (binding, payload) = c.into_parts();
            clip.insert(binding, payload)?;
        }
        Ok(clip)
    }
}

impl ClipStore for AnimationClip {
    fn bindings(&self, kind: CurveKind) -> Vec<CurveBinding> {
        self.curves
            .keys()
            .filter(|b| b.kind == kind)
            .cloned()
            .collect()
    }

    fn curve(&self, binding: &CurveBinding) -> Option<CurvePayload> {
        self.curves.get(binding).cloned()
    }

    fn set_curve(
        &mut self,
        binding: &CurveBinding,
        payload: Option<CurvePayload>,
    ) -> Result<(), ClipError> {
        match payload {
            Some(payload) => {
                if payload.kind() != binding.kind {
                    return Err(ClipError::KindMismatch {
                        path: binding.path.clone(),
                        binding: binding.kind,
                        payload: payload.kind(),
                    });
                }
                if !is_well_formed_path(&binding.path) {
                    return Err(ClipError::MalformedPath {
                        path: binding.path.clone(),
                    });
                }
                self.curves.insert(binding.clone(), payload);
            }
            None => {
                self.curves.shift_remove(binding);
            }
        }
        Ok(())
    }
}

/// Binding enumerator: the snapshot every operation reads before writing.
pub fn list_bindings<C: ClipStore + ?Sized>(clip: &C, kind: CurveKind) -> Vec<CurveBinding> {
    let bindings = clip.bindings(kind);
    log::debug!("enumerated {} {:?} bindings", bindings.len(), kind);
    bindings
}

/// One line of the curve listing a host shows next to the clip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingSummary {
    pub path: String,
    pub property_name: String,
    pub key_count: usize,
}

impl fmt::Display for BindingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}, Keys: {}",
            self.path, self.property_name, self.key_count
        )
    }
}

pub fn summarize<C: ClipStore + ?Sized>(clip: &C, kind: CurveKind) -> Vec<BindingSummary> {
    clip.bindings(kind)
        .into_iter()
        .map(|b| {
            let key_count = clip.curve(&b).map(|p| p.key_count()).unwrap_or(0);
            BindingSummary {
                path: b.path,
                property_name: b.property_name,
                key_count,
            }
        })
        .collect()
}

/// JSON clip form:
/// `{ "name": "...", "curves": [{ "path", "propertyName", "kind", "keys" | "objectKeys" }] }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipDocument {
    pub name: String,
    #[serde(default)]
    pub curves: Vec<CurveDocument>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveDocument {
    #[serde(default)]
    pub path: String,
    pub property_name: String,
    pub kind: CurveKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<Keyframe>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_keys: Vec<ObjectKeyframe>,
}

impl CurveDocument {
    fn from_parts(binding: &CurveBinding, payload: &CurvePayload) -> Self {
        let (keys, object_keys) = match payload {
            CurvePayload::Value(k) => (k.clone(), Vec::new()),
            CurvePayload::ObjectReference(k) => (Vec::new(), k.clone()),
        };
        Self {
            path: binding.path.clone(),
            property_name: binding.property_name.clone(),
            kind: binding.kind,
            keys,
            object_keys,
        }
    }

    fn into_parts(self) -> (CurveBinding, CurvePayload) {
        let payload = match self.kind {
            CurveKind::Value => CurvePayload::Value(self.keys),
            CurveKind::ObjectReference => CurvePayload::ObjectReference(self.object_keys),
        };
        (
            CurveBinding::new(self.path, self.property_name, self.kind),
            payload,
        )
    }
}

/// Parse a [`ClipDocument`] JSON string into an [`AnimationClip`].
pub fn parse_clip_json(s: &str) -> Result<AnimationClip, ClipError> {
    let doc: ClipDocument = serde_json::from_str(s)?;
    AnimationClip::from_document(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(v: f32) -> CurvePayload {
        CurvePayload::Value(vec![Keyframe {
            time: 0.0,
            value: v,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }])
    }

    #[test]
    fn path_shape() {
        assert!(is_well_formed_path(""));
        assert!(is_well_formed_path("Rig/Arm/Hand"));
        assert!(!is_well_formed_path("/Rig"));
        assert!(!is_well_formed_path("Rig/"));
        assert!(!is_well_formed_path("Rig//Hand"));
    }

    #[test]
    fn set_curve_rejects_kind_mismatch() {
        let mut clip = AnimationClip::new("c");
        let b = CurveBinding::new("Hand", "m_IsActive", CurveKind::ObjectReference);
        let err = clip.set_curve(&b, Some(scalar(1.0))).unwrap_err();
        assert!(matches!(err, ClipError::KindMismatch { .. }));
        assert!(clip.is_empty());
    }

    #[test]
    fn bindings_are_filtered_by_kind_in_insertion_order() {
        let clip = AnimationClip::new("c")
            .with_curve(CurveBinding::new("B", "x", CurveKind::Value), scalar(1.0))
            .with_curve(
                CurveBinding::new("S", "m_Sprite", CurveKind::ObjectReference),
                CurvePayload::ObjectReference(vec![]),
            )
            .with_curve(CurveBinding::new("A", "x", CurveKind::Value), scalar(2.0));
        let paths: Vec<_> = list_bindings(&clip, CurveKind::Value)
            .into_iter()
            .map(|b| b.path)
            .collect();
        assert_eq!(paths, vec!["B", "A"]);
        assert_eq!(clip.bindings(CurveKind::ObjectReference).len(), 1);
    }

    #[test]
    fn delete_keeps_remaining_order() {
        let a = CurveBinding::new("A", "x", CurveKind::Value);
        let b = CurveBinding::new("B", "x", CurveKind::Value);
        let c = CurveBinding::new("C", "x", CurveKind::Value);
        let mut clip = AnimationClip::new("c")
            .with_curve(a.clone(), scalar(1.0))
            .with_curve(b.clone(), scalar(2.0))
            .with_curve(c.clone(), scalar(3.0));
        clip.set_curve(&b, None).unwrap();
        assert_eq!(clip.bindings(CurveKind::Value), vec![a, c]);
    }

    #[test]
    fn summary_line_format() {
        let clip = AnimationClip::new("c").with_curve(
            CurveBinding::new("Rig/Hand", "localPosition.x", CurveKind::Value),
            scalar(1.0),
        );
        let lines: Vec<String> = summarize(&clip, CurveKind::Value)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(lines, vec!["Rig/Hand/localPosition.x, Keys: 1"]);
    }

    #[test]
    fn bit_eq_distinguishes_signed_zero_and_accepts_nan() {
        assert!(scalar(f32::NAN).bit_eq(&scalar(f32::NAN)));
        assert!(!scalar(0.0).bit_eq(&scalar(-0.0)));
        assert!(!scalar(1.0).bit_eq(&CurvePayload::ObjectReference(vec![])));
    }

    #[test]
    fn parses_clip_document() {
        let clip = parse_clip_json(
            r#"{ "name": "wave", "curves": [
                { "path": "Old/Arm/Hand", "propertyName": "localPosition.x", "kind": "value",
                  "keys": [{ "time": 0.0, "value": 1.5 }] },
                { "propertyName": "m_Sprite", "kind": "objectReference",
                  "objectKeys": [{ "time": 0.5, "object": "sprite-guid" }] }
            ] }"#,
        )
        .unwrap();
        assert_eq!(clip.len(), 2);
        let obj = &clip.bindings(CurveKind::ObjectReference)[0];
        assert_eq!(obj.path, "");
        assert_eq!(clip.curve(obj).unwrap().key_count(), 1);
        let back = AnimationClip::from_document(clip.to_document()).unwrap();
        assert_eq!(back, clip);
    }
}
