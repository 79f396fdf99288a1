//! Integration tests for presetkit-core.
//!
//! These tests run the pipeline stages against real files in a temporary
//! directory.

use presetkit_core::{
    BinaryContainer, ClassId, Endianness, Pipeline, Preset, PresetError, PresetSet, Schema,
    ToolConfig, Value, encode, extract_schema,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CLASS_ID: &str = "5DA2E4B3C1F84E6A9B0D7C3E2F1A8B9C";

const PARAMETER_HPP: &str = r#"// Copyright Someone
//
// This file is part of TestSynth.

#pragma once

#include <memory>

constexpr size_t nVoice = 2;

namespace ParameterID {
enum ID {
  bypass,
  gain,
  detune0,
  seed = detune0 + nVoice,

  ID_ENUM_LENGTH,
};
} // namespace ParameterID

struct GlobalParameter : public ParameterInterface {
  std::vector<std::unique_ptr<ValueInterface>> value;

  GlobalParameter()
  {
    value.resize(ParameterID::ID_ENUM_LENGTH);

    using Info = Steinberg::Vst::ParameterInfo;
    using ID = ParameterID::ID;

    value[ID::bypass] = std::make_unique<IntValue>(
      0, Scales::boolScale, "bypass", Info::kCanAutomate | Info::kIsBypass);
    value[ID::gain] = std::make_unique<DecibelValue>(
      Scales::gain.invmap(1.0), Scales::gain, "gain", Info::kCanAutomate);

    for (size_t idx = 0; idx < nVoice; ++idx) {
      auto indexStr = std::to_string(idx);
      value[ID::detune0 + idx] = std::make_unique<LinearValue>(
        0.5, Scales::detune, ("detune" + indexStr).c_str(), Info::kCanAutomate);
    }

    value[ID::seed]
      = std::make_unique<IntValue>(1234, Scales::seed, "seed", Info::kCanAutomate);
  }
};
"#;

/// Header, sections in order, then a chunk list pointing at them.
fn container_bytes(class_id: &str, sections: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let data_len: usize = sections.iter().map(|(_, d)| d.len()).sum();
    let list_offset = 48 + data_len as u64;

    let mut out = Vec::new();
    out.extend_from_slice(b"VST3");
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(class_id.as_bytes());
    out.extend_from_slice(&list_offset.to_le_bytes());
    for (_, data) in sections {
        out.extend_from_slice(data);
    }
    out.extend_from_slice(b"List");
    out.extend_from_slice(&(sections.len() as u32).to_le_bytes());
    let mut offset = 48u64;
    for (id, data) in sections {
        out.extend_from_slice(*id);
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&(data.len() as u64).to_le_bytes());
        offset += data.len() as u64;
    }
    out
}

fn comp_chunk(bypass: u32, gain: f64, detune: [f64; 2], seed: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&bypass.to_le_bytes());
    out.extend_from_slice(&gain.to_le_bytes());
    out.extend_from_slice(&detune[0].to_le_bytes());
    out.extend_from_slice(&detune[1].to_le_bytes());
    out.extend_from_slice(&seed.to_le_bytes());
    out
}

struct Fixture {
    _dir: TempDir,
    source: PathBuf,
    presets: PathBuf,
    pipeline: Pipeline,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let source = root.join("TestSynth/source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("parameter.hpp"), PARAMETER_HPP).unwrap();

    let class_ids = root.join("class_id.json");
    fs::write(&class_ids, format!(r#"{{ "TestSynth": "{CLASS_ID}" }}"#)).unwrap();

    let presets = root.join("presets");
    fs::create_dir_all(presets.join("bank")).unwrap();
    fs::write(
        presets.join("Default.vstpreset"),
        container_bytes(CLASS_ID, &[(b"Comp", comp_chunk(0, 0.5, [0.5, 0.5], 1234))]),
    )
    .unwrap();
    fs::write(
        presets.join("bank/Wide.vstpreset"),
        container_bytes(
            CLASS_ID,
            &[
                (b"Comp", comp_chunk(1, 0.25, [0.4, 0.6], 99)),
                (b"Cont", vec![0xAB; 12]),
                (b"Info", b"<?xml version=\"1.0\"?><MetaInfo/>".to_vec()),
            ],
        ),
    )
    .unwrap();
    fs::write(presets.join("readme.txt"), "not a preset").unwrap();

    let config = ToolConfig::default()
        .with_output_dir(root.join("out"))
        .with_class_id_table(class_ids);

    Fixture {
        source: root.join("TestSynth"),
        presets,
        pipeline: Pipeline::new(config),
        _dir: dir,
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

#[test]
fn test_extract_writes_type_json() {
    let fx = fixture();
    let report = fx.pipeline.extract_schema(&fx.source, None).unwrap();
    assert_eq!(report.plugin, "TestSynth");
    assert_eq!(report.path, fx.pipeline.layout().type_json("TestSynth"));

    let schema = Schema::from_json(&read(&report.path)).unwrap();
    let names: Vec<_> = schema.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["bypass", "gain", "detune0", "detune1", "seed"]);
    assert_eq!(schema.get("detune1").unwrap().index_expr, "detune0 + 1");
    assert_eq!(schema.chunk_size(), 4 + 8 + 8 + 8 + 4);
    assert_eq!(schema, report.schema);
}

#[test]
fn test_full_run_produces_every_artifact() {
    let fx = fixture();
    let plugin = fx.pipeline.run(&fx.source, &fx.presets, None).unwrap();
    assert_eq!(plugin, "TestSynth");

    let layout = fx.pipeline.layout();
    for path in [
        layout.type_json(&plugin),
        layout.preset_json(&plugin),
        layout.loader_source(&plugin),
        layout.table_source(&plugin),
        layout.binary_preset(&plugin, "Default", "vstpreset"),
        layout.binary_preset(&plugin, "Wide", "vstpreset"),
    ] {
        assert!(path.is_file(), "missing {}", path.display());
    }

    let set = PresetSet::from_json(&read(&layout.preset_json(&plugin))).unwrap();
    let names: Vec<_> = set.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Default", "Wide"]);

    let wide = set.get("Wide").unwrap();
    assert_eq!(wide.parameter.get("bypass"), Some(&Value::Int(1)));
    assert_eq!(wide.parameter.get("detune1"), Some(&Value::Float(0.6)));
    assert_eq!(wide.parameter.get("seed"), Some(&Value::Int(99)));

    let table = read(&layout.table_source(&plugin));
    assert!(table.contains("  presetDefault,\n  presetWide,\n"));
    assert!(table.contains("std::array<const char*, 2> programName{"));

    let loader = read(&layout.loader_source(&plugin));
    assert!(loader.contains("value[ID::detune0 + 1]->setFromNormalized(0.6);"));
    assert!(loader.contains("value[ID::seed]->setFromInt(99);"));
    assert!(!loader.contains("setFromInt(1);"), "bypass must be forced to 0");
}

#[test]
fn test_reencoded_default_matches_source_bytes() {
    let fx = fixture();
    fx.pipeline.run(&fx.source, &fx.presets, None).unwrap();

    let original = fs::read(fx.presets.join("Default.vstpreset")).unwrap();
    let written = fs::read(
        fx.pipeline
            .layout()
            .binary_preset("TestSynth", "Default", "vstpreset"),
    )
    .unwrap();
    assert_eq!(written, original);
}

#[test]
fn test_reencoded_third_party_keeps_values_drops_extra_sections() {
    let fx = fixture();
    fx.pipeline.run(&fx.source, &fx.presets, None).unwrap();

    let bytes = fs::read(
        fx.pipeline
            .layout()
            .binary_preset("TestSynth", "Wide", "vstpreset"),
    )
    .unwrap();
    let container = BinaryContainer::decode(&bytes, Endianness::Little).unwrap();
    assert_eq!(container.entries.len(), 1);
    assert_eq!(container.class_id, CLASS_ID);
    assert_eq!(
        container.component_chunk().unwrap(),
        comp_chunk(0, 0.25, [0.4, 0.6], 99).as_slice()
    );
}

#[test]
fn test_stages_rerun_from_edited_json() {
    let fx = fixture();
    let plugin = fx.pipeline.run(&fx.source, &fx.presets, None).unwrap();
    let layout = fx.pipeline.layout();

    let mut presets: Vec<Preset> =
        serde_json::from_str(&read(&layout.preset_json(&plugin))).unwrap();
    presets.push(
        Preset::new("Airy")
            .with_param("bypass", 0)
            .with_param("gain", 0.9)
            .with_param("detune0", 0.1)
            .with_param("detune1", 0.9)
            .with_param("seed", 7),
    );
    fs::write(
        layout.preset_json(&plugin),
        serde_json::to_string_pretty(&presets).unwrap(),
    )
    .unwrap();

    let generated = fx.pipeline.json_to_code(&plugin).unwrap();
    assert_eq!(
        generated.identifiers,
        vec!["presetDefault", "presetAiry", "presetWide"]
    );
    let written = fx.pipeline.json_to_binary(&plugin).unwrap();
    assert_eq!(written.len(), 3);
    assert!(layout.binary_preset(&plugin, "Airy", "vstpreset").is_file());
}

#[test]
fn test_truncated_preset_names_file() {
    let fx = fixture();
    let bad = fx.presets.join("Broken.vstpreset");
    fs::write(
        &bad,
        container_bytes(CLASS_ID, &[(b"Comp", vec![0u8; 10])]),
    )
    .unwrap();

    fx.pipeline.extract_schema(&fx.source, None).unwrap();
    let err = fx
        .pipeline
        .binary_to_json("TestSynth", &fx.presets)
        .unwrap_err();
    match err {
        PresetError::InFile { path, source } => {
            assert_eq!(path, bad);
            assert!(matches!(*source, PresetError::Truncation { .. }));
        }
        other => panic!("expected InFile, got {other:?}"),
    }
    assert!(!fx.pipeline.layout().preset_json("TestSynth").exists());
}

#[test]
fn test_nan_preset_value_names_file_and_parameter() {
    let fx = fixture();
    let bad = fx.presets.join("Glitch.vstpreset");
    fs::write(
        &bad,
        container_bytes(
            CLASS_ID,
            &[(b"Comp", comp_chunk(0, f64::NAN, [0.5, 0.5], 1))],
        ),
    )
    .unwrap();

    fx.pipeline.extract_schema(&fx.source, None).unwrap();
    let err = fx
        .pipeline
        .binary_to_json("TestSynth", &fx.presets)
        .unwrap_err();
    match err {
        PresetError::InFile { path, source } => {
            assert_eq!(path, bad);
            assert!(
                matches!(*source, PresetError::InvalidValue { ref preset, ref param, .. }
                    if preset == "Glitch" && param == "gain"),
                "got: {source}"
            );
        }
        other => panic!("expected InFile, got {other:?}"),
    }
    assert!(!fx.pipeline.layout().preset_json("TestSynth").exists());
}

#[test]
fn test_unknown_class_id_writes_nothing() {
    let fx = fixture();
    fx.pipeline.extract_schema(&fx.source, Some("Other")).unwrap();
    fx.pipeline.binary_to_json("Other", &fx.presets).unwrap();

    let err = fx.pipeline.json_to_binary("Other").unwrap_err();
    assert!(matches!(err, PresetError::MissingInput(ref m) if m.contains("Other")));
    assert!(!fx.pipeline.layout().binary_dir("Other").exists());
}

#[test]
fn test_missing_preset_dir() {
    let fx = fixture();
    fx.pipeline.extract_schema(&fx.source, None).unwrap();
    let err = fx
        .pipeline
        .binary_to_json("TestSynth", &fx.presets.join("nope"))
        .unwrap_err();
    assert!(matches!(err, PresetError::MissingInput(_)));
}

#[test]
fn test_big_endian_presets() {
    let fx = fixture();
    let be_dir = fx.presets.parent().unwrap().join("be");
    fs::create_dir_all(&be_dir).unwrap();

    let mut comp = Vec::new();
    comp.extend_from_slice(&0u32.to_be_bytes());
    comp.extend_from_slice(&0.75f64.to_be_bytes());
    comp.extend_from_slice(&0.5f64.to_be_bytes());
    comp.extend_from_slice(&0.5f64.to_be_bytes());
    comp.extend_from_slice(&5u32.to_be_bytes());

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"VST3");
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.extend_from_slice(CLASS_ID.as_bytes());
    bytes.extend_from_slice(&(48 + comp.len() as u64).to_be_bytes());
    bytes.extend_from_slice(&comp);
    bytes.extend_from_slice(b"List");
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.extend_from_slice(b"Comp");
    bytes.extend_from_slice(&48u64.to_be_bytes());
    bytes.extend_from_slice(&(comp.len() as u64).to_be_bytes());
    fs::write(be_dir.join("Default.vstpreset"), bytes).unwrap();

    let config = fx
        .pipeline
        .config()
        .clone()
        .with_endianness(Endianness::Big);
    let pipeline = Pipeline::new(config);
    pipeline.extract_schema(&fx.source, None).unwrap();
    let set = pipeline.binary_to_json("TestSynth", &be_dir).unwrap();
    let default = set.get("Default").unwrap();
    assert_eq!(default.parameter.get("gain"), Some(&Value::Float(0.75)));
    assert_eq!(default.parameter.get("seed"), Some(&Value::Int(5)));
}

#[test]
fn test_library_round_trip_without_pipeline() {
    let schema = extract_schema(PARAMETER_HPP).unwrap().schema;
    let class_id = ClassId::new(CLASS_ID).unwrap();
    let preset = Preset::new("Default")
        .with_param("gain", 0.3)
        .with_param("detune0", 0.2)
        .with_param("detune1", 0.8)
        .with_param("seed", 42);

    let bytes = encode(&preset, &schema, &class_id, "bypass").unwrap();
    let container = BinaryContainer::decode(&bytes, Endianness::Little).unwrap();
    let values =
        presetkit_core::unpack(container.component_chunk().unwrap(), &schema, Endianness::Little)
            .unwrap();
    assert_eq!(values.get("bypass"), Some(&Value::Int(0)));
    assert_eq!(values.get("gain"), Some(&Value::Float(0.3)));
    assert_eq!(values.get("seed"), Some(&Value::Int(42)));
}
