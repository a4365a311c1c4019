// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Generates Kubernetes CRD YAML files from the provider types in src/crd/.
//! Each CRD serves `v1alpha1` and `v1alpha2`, with `v1alpha2` as the storage version.
//!
//! Usage:
//!   cargo run --bin crdgen
//!
//! Generated files will be written to deploy/crds/ with proper headers.

use capi_operator::constants::API_VERSION_V1ALPHA2;
use capi_operator::crd::{v1alpha1, v1alpha2};
use kube::core::crd::merge_crds;
use kube::CustomResourceExt;
use std::fs;
use std::path::Path;

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd/
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("deploy/crds");

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    println!("Generating CRD YAML files from src/crd/...");

    generate_crd::<v1alpha1::CoreProvider, v1alpha2::CoreProvider>(output_dir)?;
    generate_crd::<v1alpha1::BootstrapProvider, v1alpha2::BootstrapProvider>(output_dir)?;
    generate_crd::<v1alpha1::ControlPlaneProvider, v1alpha2::ControlPlaneProvider>(output_dir)?;
    generate_crd::<v1alpha1::InfrastructureProvider, v1alpha2::InfrastructureProvider>(
        output_dir,
    )?;
    generate_crd::<v1alpha1::IPAMProvider, v1alpha2::IPAMProvider>(output_dir)?;
    generate_crd::<v1alpha1::AddonProvider, v1alpha2::AddonProvider>(output_dir)?;
    generate_crd::<v1alpha1::RuntimeExtensionProvider, v1alpha2::RuntimeExtensionProvider>(
        output_dir,
    )?;

    println!("✓ Successfully generated CRD YAML files in deploy/crds/");
    println!("\nNext steps:");
    println!("  1. Review the generated files");
    println!("  2. Deploy with: kubectl apply -f deploy/crds/");

    Ok(())
}

/// Write one multi-version CRD named after its plural.
fn generate_crd<Old, Hub>(output_dir: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    Old: CustomResourceExt,
    Hub: CustomResourceExt,
{
    let crd = merge_crds(vec![Old::crd(), Hub::crd()], API_VERSION_V1ALPHA2)?;
    let yaml = serde_yaml::to_string(&crd)?;

    // Add copyright header
    let content = format!("{COPYRIGHT_HEADER}{yaml}");

    let filename = format!("{}.crd.yaml", Hub::crd_name());
    let output_path = output_dir.join(&filename);
    fs::write(&output_path, content)?;

    println!("  ✓ Generated {filename}");

    Ok(())
}
