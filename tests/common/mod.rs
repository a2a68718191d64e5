//! Shared fixture: a complete, correctly shaped all-zero weights archive for
//! the reference configuration (ResNet-50 backbone, 2 anchors, 5 landmarks).
//! Batch-norm entries carry identity statistics (gamma=1, beta=0, mean=0,
//! var=1) so the zero network stays numerically well-defined.

use safetensors::tensor::TensorView;
use safetensors::Dtype;

pub type Entry = (String, Vec<usize>, Vec<f32>);

fn conv(entries: &mut Vec<Entry>, name: &str, k: usize, cin: usize, cout: usize, bias: bool) {
    entries.push((
        format!("{name}.weight"),
        vec![k, k, cin, cout],
        vec![0.0; k * k * cin * cout],
    ));
    if bias {
        entries.push((format!("{name}.bias"), vec![cout], vec![0.0; cout]));
    }
}

fn bn(entries: &mut Vec<Entry>, name: &str, channels: usize) {
    entries.push((format!("{name}.gamma"), vec![channels], vec![1.0; channels]));
    entries.push((format!("{name}.beta"), vec![channels], vec![0.0; channels]));
    entries.push((
        format!("{name}.running_mean"),
        vec![channels],
        vec![0.0; channels],
    ));
    entries.push((
        format!("{name}.running_var"),
        vec![channels],
        vec![1.0; channels],
    ));
}

fn conv_bn(entries: &mut Vec<Entry>, name: &str, k: usize, cin: usize, cout: usize) {
    conv(entries, name, k, cin, cout, true);
    bn(entries, &format!("{name}_bn"), cout);
}

/// Every layer of the reference graph, in construction order.
pub fn reference_entries() -> Vec<Entry> {
    let mut entries = Vec::new();

    bn(&mut entries, "bn_data", 3);
    conv(&mut entries, "conv0", 7, 3, 64, false);
    bn(&mut entries, "bn0", 64);

    // Residual stages: unit depths {3, 4, 6, 3}.
    let mut cin = 64;
    for (i, units) in [3, 4, 6, 3].into_iter().enumerate() {
        let stage = i + 1;
        let cmid = 64 << i;
        let cout = 256 << i;
        for unit in 1..=units {
            let p = format!("stage{stage}_unit{unit}");
            let unit_in = if unit == 1 { cin } else { cout };
            bn(&mut entries, &format!("{p}_bn1"), unit_in);
            conv(&mut entries, &format!("{p}_conv1"), 1, unit_in, cmid, false);
            bn(&mut entries, &format!("{p}_bn2"), cmid);
            conv(&mut entries, &format!("{p}_conv2"), 3, cmid, cmid, false);
            bn(&mut entries, &format!("{p}_bn3"), cmid);
            conv(&mut entries, &format!("{p}_conv3"), 1, cmid, cout, false);
            if unit == 1 {
                conv(&mut entries, &format!("{p}_sc"), 1, unit_in, cout, false);
            }
        }
        cin = cout;
    }
    bn(&mut entries, "bn1", 2048);

    // Pyramid laterals and aggregation.
    conv_bn(&mut entries, "ssh_c3_lateral", 1, 2048, 256);
    conv_bn(&mut entries, "ssh_c2_lateral", 1, 512, 256);
    conv_bn(&mut entries, "ssh_m1_red_conv", 1, 256, 256);
    conv_bn(&mut entries, "ssh_c2_aggr", 3, 256, 256);
    conv_bn(&mut entries, "ssh_c1_aggr", 3, 256, 256);

    // SSH context modules.
    for scale in ["m1", "m2", "m3"] {
        conv_bn(&mut entries, &format!("ssh_{scale}_det_conv1"), 3, 256, 256);
        conv_bn(
            &mut entries,
            &format!("ssh_{scale}_det_context_conv1"),
            3,
            256,
            128,
        );
        conv_bn(
            &mut entries,
            &format!("ssh_{scale}_det_context_conv2"),
            3,
            128,
            128,
        );
        conv_bn(
            &mut entries,
            &format!("ssh_{scale}_det_context_conv3_1"),
            3,
            128,
            128,
        );
        conv_bn(
            &mut entries,
            &format!("ssh_{scale}_det_context_conv3_2"),
            3,
            128,
            128,
        );
    }

    // Detection heads: 2 anchors, 5 landmark points.
    for stride in [32, 16, 8] {
        conv(
            &mut entries,
            &format!("face_rpn_cls_score_stride{stride}"),
            1,
            512,
            4,
            true,
        );
        conv(
            &mut entries,
            &format!("face_rpn_bbox_pred_stride{stride}"),
            1,
            512,
            8,
            true,
        );
        conv(
            &mut entries,
            &format!("face_rpn_landmark_pred_stride{stride}"),
            1,
            512,
            20,
            true,
        );
    }

    entries
}

/// Serializes entries into safetensors archive bytes.
pub fn serialize(entries: &[Entry]) -> Vec<u8> {
    let bytes: Vec<Vec<u8>> = entries
        .iter()
        .map(|(_, _, values)| values.iter().flat_map(|v| v.to_le_bytes()).collect())
        .collect();
    let views: Vec<(String, TensorView<'_>)> = entries
        .iter()
        .zip(&bytes)
        .map(|((key, shape, _), data)| {
            (
                key.clone(),
                TensorView::new(Dtype::F32, shape.clone(), data).unwrap(),
            )
        })
        .collect();
    safetensors::serialize(views, &None).unwrap()
}

/// A complete all-zero archive.
pub fn zero_archive() -> Vec<u8> {
    serialize(&reference_entries())
}

/// A complete archive minus every key of the named layer.
pub fn archive_without(layer: &str) -> Vec<u8> {
    let prefix = format!("{layer}.");
    let entries: Vec<Entry> = reference_entries()
        .into_iter()
        .filter(|(key, _, _)| !key.starts_with(&prefix))
        .collect();
    serialize(&entries)
}
