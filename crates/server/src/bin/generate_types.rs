use std::{env, fs, path::Path};

use anyhow::{Context, bail};
use ts_rs::TS;

fn generate_types_content() -> String {
    let decls: Vec<String> = vec![
        db::models::values::LocationType::decl(),
        db::models::values::GrowingUnitType::decl(),
        db::models::values::PlantStatus::decl(),
        db::models::values::PlantCategory::decl(),
        db::models::values::GrowthRate::decl(),
        db::models::values::SunRequirement::decl(),
        db::models::values::WaterRequirement::decl(),
        db::models::values::DimensionUnit::decl(),
        db::models::values::Dimensions::decl(),
        db::models::values::PhRange::decl(),
        db::models::values::TemperatureRange::decl(),
        db::models::location::Location::decl(),
        db::models::location::CreateLocation::decl(),
        db::models::location::UpdateLocation::decl(),
        db::models::growing_unit::GrowingUnit::decl(),
        db::models::growing_unit::DimensionsInput::decl(),
        db::models::growing_unit::CreateGrowingUnit::decl(),
        db::models::growing_unit::UpdateGrowingUnit::decl(),
        db::models::growing_unit::MoveGrowingUnit::decl(),
        db::models::plant::Plant::decl(),
        db::models::plant::CreatePlant::decl(),
        db::models::plant::UpdatePlant::decl(),
        db::models::plant::ChangePlantStatus::decl(),
        db::models::plant::TransplantPlant::decl(),
        db::models::plant_species::PlantSpecies::decl(),
        db::models::plant_species::RangeInput::decl(),
        db::models::plant_species::CreatePlantSpecies::decl(),
        db::models::plant_species::UpdatePlantSpecies::decl(),
        db::models::views::LocationSummary::decl(),
        db::models::views::GrowingUnitSummary::decl(),
        db::models::views::SpeciesSummary::decl(),
        db::models::views::PlantSummary::decl(),
        db::models::views::LocationView::decl(),
        db::models::views::GrowingUnitView::decl(),
        db::models::views::PlantView::decl(),
        db::models::views::PlantSpeciesView::decl(),
        db::models::views::Totals::decl(),
        db::models::views::CapacityStats::decl(),
        db::models::views::PlantDistribution::decl(),
        db::models::views::UnitOccupancy::decl(),
        db::models::views::OverviewView::decl(),
        services::services::query::SortField::decl(),
        services::services::query::SortDirection::decl(),
        services::services::query::Paginated::<()>::decl(),
        services::services::locations::LocationFilter::decl(),
        services::services::growing_units::GrowingUnitFilter::decl(),
        services::services::plants::PlantFilter::decl(),
        services::services::plant_species::PlantSpeciesFilter::decl(),
        services::services::projector::RebuildSummary::decl(),
        server::routes::health::HealthStatus::decl(),
        utils::response::ApiResponse::<()>::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| {
            let trimmed = d.trim_start();
            if trimmed.starts_with("export") {
                d
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `crates/server/src/bin/generate_types.rs`.\n\n// Do not edit this file manually.\n\n{body}\n"
    )
}

fn main() -> anyhow::Result<()> {
    let check_mode = env::args().any(|arg| arg == "--check");

    let shared_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path)
            .with_context(|| format!("reading {}", types_path.display()))?;
        if current == generated {
            println!("✅ shared/types.ts is up to date.");
            return Ok(());
        }
        bail!("shared/types.ts is not up to date. Please run `cargo run --bin generate_types`");
    }

    println!("Generating TypeScript types…");
    fs::create_dir_all(&shared_path)?;
    fs::write(&types_path, generated)?;
    println!("✅ TypeScript types written to {}", types_path.display());
    Ok(())
}
