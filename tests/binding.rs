//! Build-time binding coverage: the builder either binds every layer it
//! references or fails with the offending layer name.

mod common;

use burn::backend::ndarray::NdArray;
use retinaface_burn::{
    BuildError, RetinaFace, RetinaFaceConfig, WeightKind, WeightStore,
};

type B = NdArray;

fn build(bytes: &[u8]) -> Result<RetinaFace<B>, BuildError> {
    let store = WeightStore::from_bytes(bytes).unwrap();
    RetinaFace::from_store(&store, &RetinaFaceConfig::default(), &Default::default())
}

#[test]
fn complete_store_builds() {
    // The fixture carries shortcut weights only for the first unit of each
    // stage, so a successful build also shows that no other unit binds one.
    assert!(build(&common::zero_archive()).is_ok());
}

#[test]
fn missing_convolution_is_named() {
    let err = build(&common::archive_without("stage3_unit2_conv1")).unwrap_err();
    match err {
        BuildError::MissingWeight(err) => {
            assert_eq!(err.layer, "stage3_unit2_conv1");
            assert_eq!(err.kind, WeightKind::Convolution);
        }
        other => panic!("expected MissingWeight, got {other:?}"),
    }
}

#[test]
fn missing_batch_norm_is_named() {
    let err = build(&common::archive_without("ssh_c2_aggr_bn")).unwrap_err();
    match err {
        BuildError::MissingWeight(err) => {
            assert_eq!(err.layer, "ssh_c2_aggr_bn");
            assert_eq!(err.kind, WeightKind::BatchNorm);
        }
        other => panic!("expected MissingWeight, got {other:?}"),
    }
}

#[test]
fn missing_projection_shortcut_is_named() {
    let err = build(&common::archive_without("stage2_unit1_sc")).unwrap_err();
    match err {
        BuildError::MissingWeight(err) => assert_eq!(err.layer, "stage2_unit1_sc"),
        other => panic!("expected MissingWeight, got {other:?}"),
    }
}

#[test]
fn missing_head_is_named() {
    let err = build(&common::archive_without("face_rpn_landmark_pred_stride8")).unwrap_err();
    match err {
        BuildError::MissingWeight(err) => {
            assert_eq!(err.layer, "face_rpn_landmark_pred_stride8")
        }
        other => panic!("expected MissingWeight, got {other:?}"),
    }
}

#[test]
fn wrong_kernel_shape_is_rejected() {
    let mut entries = common::reference_entries();
    let conv0 = entries
        .iter_mut()
        .find(|(key, _, _)| key == "conv0.weight")
        .unwrap();
    // 3x3 where the graph needs 7x7.
    conv0.1 = vec![3, 3, 3, 64];
    conv0.2 = vec![0.0; 3 * 3 * 3 * 64];

    let err = build(&common::serialize(&entries)).unwrap_err();
    match err {
        BuildError::ShapeMismatch(err) => {
            assert_eq!(err.op, "conv0");
            assert_eq!(err.expected, vec![7, 7, 3, 64]);
            assert_eq!(err.found, vec![3, 3, 3, 64]);
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

#[test]
fn wrong_batch_norm_width_is_rejected() {
    let mut entries = common::reference_entries();
    for (key, shape, values) in entries.iter_mut() {
        if key.starts_with("bn0.") {
            *shape = vec![32];
            values.truncate(32);
        }
    }

    let err = build(&common::serialize(&entries)).unwrap_err();
    match err {
        BuildError::ShapeMismatch(err) => {
            assert_eq!(err.op, "bn0");
            assert_eq!(err.expected, vec![64]);
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}
