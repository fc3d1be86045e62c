use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::config::const_funcs::normed;
use crate::config::constants::{CAHORA_BASSA_REFERENCE_INFLOW_MW, CROSS_BORDER_STATION, GWH_TO_MWH};
use crate::config::model_config::ModelConfig;
use crate::core::network::Network;
use crate::data::costs_loader::{build_cost_table, CostTable};
use crate::data::fleet_loader::FleetRecord;
use crate::data::hydro_loader::InflowTable;
use crate::data::load_loader::LoadSeries;
use crate::data::regions_loader::{containing_region, nearest_region, SupplyRegion};
use crate::data::renewables_loader::{AreaRecord, ProfileTable};
use crate::data::sources::{InputData, RENEWABLE_CARRIERS};
use crate::models::branch::LineType;
use crate::models::bus::Bus;
use crate::models::carrier::Carrier;
use crate::models::generator::Generator;
use crate::models::load::Load;
use crate::models::storage_unit::StorageUnit;
use crate::utils::logging::{self, BuildStage, OperationCategory};

/// Build the complete base network for one region setup.
pub fn assemble_network(
    config: &ModelConfig,
    region_setup: &str,
    regions: &[SupplyRegion],
    inputs: &InputData,
) -> Result<(Network, CostTable)> {
    let _timing = logging::start_timing(
        "assemble_network",
        OperationCategory::NetworkBuild {
            subcategory: BuildStage::Topology,
        },
    );

    let mut n = Network::new(format!("elec-{}", region_setup));

    for (name, i_nom) in &config.lines.line_types {
        n.add_line_type(LineType {
            name: name.clone(),
            i_nom: *i_nom,
        });
    }

    for region in regions {
        n.add_bus(Bus::new(
            region.name.clone(),
            config.electricity.v_nom,
            region.position.clone(),
            region.population,
        ));
    }

    for line in &inputs.lines {
        n.add_line(line.clone());
    }
    for link in &inputs.links {
        n.add_link(link.clone());
    }

    attach_load(&mut n, &inputs.load, config)?;

    let n_years = n.n_years();
    let costs = build_cost_table(
        &inputs.cost_records,
        &config.costs,
        config.year,
        &config.electricity.max_hours,
        n_years,
    )?;
    info!(
        "Cost table assembled for {} with {} technologies over {:.3} years",
        config.year,
        costs.technologies().len(),
        n_years
    );

    update_transmission_costs(&mut n, &costs, config.lines.length_factor, false)?;
    attach_existing_fleet(&mut n, &costs, &inputs.fleet, &inputs.inflow, regions, config, region_setup)?;
    attach_wind_and_solar(&mut n, &costs, &inputs.areas, &inputs.profiles, config)?;
    attach_extendable_generators(&mut n, &costs, config, region_setup)?;
    attach_storage(&mut n, &costs, config, region_setup)?;

    let issues = n.validate();
    for issue in &issues {
        warn!("Network validation: {}", issue);
    }

    Ok((n, costs))
}

/// Distribute the national demand profile over all buses by population.
pub fn attach_load(n: &mut Network, load: &LoadSeries, config: &ModelConfig) -> Result<()> {
    let _timing = logging::start_timing(
        "attach_load",
        OperationCategory::NetworkBuild {
            subcategory: BuildStage::Load,
        },
    );

    n.set_snapshots(load.timestamps.clone(), vec![1.0; load.timestamps.len()]);

    let profile = normed(&load.values_mw);
    let populations: Vec<f64> = n.buses().iter().map(|b| b.population).collect();
    let weights = normed(&populations);
    if weights.iter().all(|w| *w == 0.0) {
        return Err(anyhow!("all buses have zero population"));
    }

    let demand = config.electricity.demand;
    let bus_names = n.bus_names();
    for (bus, weight) in bus_names.iter().zip(weights) {
        let series: Vec<f64> = profile.iter().map(|p| demand * p * weight).collect();
        n.add_load(Load::new(bus.clone(), bus.clone()));
        n.loads_p_set_mut().set_column(bus, series);
    }
    Ok(())
}

/// Capital costs of transmission from corridor lengths and reference costs.
pub fn update_transmission_costs(
    n: &mut Network,
    costs: &CostTable,
    length_factor: f64,
    simple_hvdc_costs: bool,
) -> Result<()> {
    let hvac = costs.at("HVAC overhead")?.capital_cost;
    for line in n.lines_mut() {
        line.capital_cost = line.length * length_factor * hvac;
    }

    if n.links().is_empty() {
        return Ok(());
    }
    if !n.links().iter().any(|l| l.is_dc()) {
        return Ok(());
    }

    let overhead = costs.at("HVDC overhead")?.capital_cost;
    let submarine = costs.at("HVDC submarine")?.capital_cost;
    let inverter_pair = costs.at("HVDC inverter pair")?.capital_cost;
    for link in n.links_mut() {
        if !link.is_dc() {
            continue;
        }
        link.capital_cost = if simple_hvdc_costs {
            link.length * length_factor * overhead
        } else {
            link.length
                * length_factor
                * ((1.0 - link.underwater_fraction) * overhead
                    + link.underwater_fraction * submarine)
                + inverter_pair
        };
    }
    Ok(())
}

fn assign_bus(regions: &[SupplyRegion], record: &FleetRecord) -> Option<String> {
    let position = record.position.as_ref()?;
    if let Some(region) = containing_region(regions, position) {
        return Some(region.name.clone());
    }
    nearest_region(regions, position).map(|r| r.name.clone())
}

/// Attach the existing conventional fleet: coal and nuclear stations as
/// generators, hydro and pumped storage as storage units with inflow.
pub fn attach_existing_fleet(
    n: &mut Network,
    costs: &CostTable,
    fleet: &[FleetRecord],
    inflow: &InflowTable,
    regions: &[SupplyRegion],
    config: &ModelConfig,
    region_setup: &str,
) -> Result<()> {
    let _timing = logging::start_timing(
        "attach_existing_fleet",
        OperationCategory::NetworkBuild {
            subcategory: BuildStage::Fleet,
        },
    );

    let mut hydro: Vec<(FleetRecord, String)> = Vec::new();
    let mut csp: Vec<(FleetRecord, String)> = Vec::new();
    let mut conventionals: Vec<(FleetRecord, String)> = Vec::new();

    for record in fleet {
        let bus = if record.name == CROSS_BORDER_STATION {
            match config.electricity.cross_border_bus.get(region_setup) {
                Some(bus) => bus.clone(),
                None => {
                    warn!(
                        "No cross border bus configured for setup {}, dropping {}",
                        region_setup, record.name
                    );
                    continue;
                }
            }
        } else {
            if record.p_nom <= 0.0 {
                warn!("Dropping {} without capacity", record.name);
                continue;
            }
            match assign_bus(regions, record) {
                Some(bus) => bus,
                None => {
                    warn!("Dropping {} without usable coordinates", record.name);
                    continue;
                }
            }
        };

        match record.carrier.as_str() {
            "hydro" | "PHS" => hydro.push((record.clone(), bus)),
            "CSP" => csp.push((record.clone(), bus)),
            "coal" | "nuclear" => conventionals.push((record.clone(), bus)),
            other => {
                warn!("Dropping {} with unhandled carrier {}", record.name, other);
            }
        }
    }

    for (record, bus) in &conventionals {
        n.ensure_carrier(Carrier::new(
            record.carrier.clone(),
            costs.co2_emissions_for(&record.carrier),
        ));
        n.add_generator(Generator {
            name: record.name.clone(),
            bus: bus.clone(),
            carrier: record.carrier.clone(),
            p_nom: record.p_nom,
            efficiency: record.efficiency.unwrap_or(1.0),
            capital_cost: record.capital_cost.unwrap_or(0.0),
            marginal_cost: record.marginal_cost.unwrap_or(0.0),
            ramp_limit_up: record.ramp_limit_up,
            ..Default::default()
        });
    }

    attach_hydro_storage(n, costs, &hydro, inflow)?;

    if config.electricity.csp {
        n.ensure_carrier(Carrier::new("CSP".to_string(), 0.0));
        for (record, bus) in &csp {
            n.add_storage_unit(StorageUnit {
                name: record.name.clone(),
                bus: bus.clone(),
                carrier: "CSP".to_string(),
                p_nom: record.p_nom,
                max_hours: record.csp_storage_hours.unwrap_or(0.0),
                capital_cost: record.capital_cost.unwrap_or(0.0),
                marginal_cost: record.marginal_cost.unwrap_or(0.0),
                ..Default::default()
            });
        }
    } else if !csp.is_empty() {
        info!("CSP disabled, dropping {} stations", csp.len());
    }

    Ok(())
}

fn attach_hydro_storage(
    n: &mut Network,
    costs: &CostTable,
    hydro: &[(FleetRecord, String)],
    inflow: &InflowTable,
) -> Result<()> {
    if hydro.is_empty() {
        return Ok(());
    }

    n.ensure_carrier(Carrier::new("hydro".to_string(), costs.co2_emissions_for("hydro")));
    n.ensure_carrier(Carrier::new("PHS".to_string(), costs.co2_emissions_for("PHS")));

    // Stations without a storage figure fall back to the fleet average
    let known_hours: Vec<f64> = hydro
        .iter()
        .filter_map(|(r, _)| r.max_storage_gwh.map(|gwh| GWH_TO_MWH * gwh / r.p_nom))
        .collect();
    let mean_hours = if known_hours.is_empty() {
        warn!("No storage capacity figures in the hydro fleet, assuming zero");
        0.0
    } else {
        known_hours.iter().sum::<f64>() / known_hours.len() as f64
    };

    for (record, bus) in hydro {
        let round_trip = record
            .pump_efficiency_pct
            .map(|pct| (pct / 100.0).sqrt())
            .unwrap_or(1.0);
        let max_hours = record
            .max_storage_gwh
            .map(|gwh| GWH_TO_MWH * gwh / record.p_nom)
            .unwrap_or(mean_hours);
        let p_min_pu = match (record.pump_load_mw, record.pump_units) {
            (Some(load), Some(units)) => -(load * units / record.p_nom),
            _ => 0.0,
        };

        n.add_storage_unit(StorageUnit {
            name: record.name.clone(),
            bus: bus.clone(),
            carrier: record.carrier.clone(),
            p_nom: record.p_nom,
            max_hours,
            efficiency_store: round_trip,
            efficiency_dispatch: round_trip,
            p_min_pu,
            p_max_pu: 1.0,
            cyclic_state_of_charge: true,
            capital_cost: record.capital_cost.unwrap_or(0.0),
            marginal_cost: record.marginal_cost.unwrap_or(0.0),
            ..Default::default()
        });
    }

    // Domestic inflow is shared by capacity; the cross border station is
    // scaled against its long-run average instead.
    let snapshots = n.snapshots().to_vec();
    let za_inflow = inflow.aligned_column("ZA", &snapshots);
    let mz_inflow = inflow.aligned_column("MZ", &snapshots);

    let domestic: Vec<&(FleetRecord, String)> = hydro
        .iter()
        .filter(|(r, _)| r.name != CROSS_BORDER_STATION)
        .collect();
    let capacities: Vec<f64> = domestic.iter().map(|(r, _)| r.p_nom).collect();
    let shares = normed(&capacities);

    for ((record, _), share) in domestic.iter().zip(shares) {
        let series: Vec<f64> = za_inflow.iter().map(|v| v * share).collect();
        n.storage_units_inflow_mut().set_column(&record.name, series);
    }
    if let Some((record, _)) = hydro.iter().find(|(r, _)| r.name == CROSS_BORDER_STATION) {
        let scale = record.p_nom / CAHORA_BASSA_REFERENCE_INFLOW_MW;
        let series: Vec<f64> = mz_inflow.iter().map(|v| v * scale).collect();
        n.storage_units_inflow_mut().set_column(&record.name, series);
    }

    Ok(())
}

/// Attach one extendable wind or solar generator per region with available
/// area, with availability profiles aligned to the snapshots.
pub fn attach_wind_and_solar(
    n: &mut Network,
    costs: &CostTable,
    areas: &HashMap<String, Vec<AreaRecord>>,
    profiles: &HashMap<String, ProfileTable>,
    config: &ModelConfig,
) -> Result<()> {
    let _timing = logging::start_timing(
        "attach_wind_and_solar",
        OperationCategory::NetworkBuild {
            subcategory: BuildStage::Renewables,
        },
    );

    let snapshots = n.snapshots().to_vec();
    for carrier in RENEWABLE_CARRIERS {
        let carrier_areas = match areas.get(carrier) {
            Some(a) => a,
            None => {
                warn!("No area data for {}, skipping", carrier);
                continue;
            }
        };
        let carrier_profiles = profiles.get(carrier);
        let per_sqm = config
            .respotentials
            .capacity_per_sqm
            .get(carrier)
            .copied()
            .ok_or_else(|| anyhow!("no capacity_per_sqm entry for {}", carrier))?;
        let tech = costs.at(carrier)?.clone();
        n.ensure_carrier(Carrier::new(
            carrier.to_string(),
            costs.co2_emissions_for(carrier),
        ));

        for area in carrier_areas {
            if n.bus(&area.region).is_none() {
                warn!(
                    "Area record for unknown region {} ({}), skipping",
                    area.region, carrier
                );
                continue;
            }
            let name = format!("{} {}", area.region, carrier);
            n.add_generator(Generator {
                name: name.clone(),
                bus: area.region.clone(),
                carrier: carrier.to_string(),
                p_nom_extendable: true,
                p_nom_max: area.available_area * per_sqm,
                efficiency: tech.efficiency,
                capital_cost: tech.capital_cost,
                marginal_cost: tech.marginal_cost,
                ..Default::default()
            });
            let series = match carrier_profiles {
                Some(table) => table.aligned_column(&area.region, &snapshots),
                None => vec![0.0; snapshots.len()],
            };
            n.generators_p_max_pu_mut().set_column(&name, series);
        }
    }
    Ok(())
}

/// One extendable generator per candidate bus for every configured carrier.
pub fn attach_extendable_generators(
    n: &mut Network,
    costs: &CostTable,
    config: &ModelConfig,
    region_setup: &str,
) -> Result<()> {
    let _timing = logging::start_timing(
        "attach_extendable_generators",
        OperationCategory::NetworkBuild {
            subcategory: BuildStage::Extendable,
        },
    );

    let carriers = config.electricity.extendable_carriers.generator.clone();
    for carrier in &carriers {
        let tech = costs
            .at(carrier)
            .with_context(|| format!("extendable generator carrier {}", carrier))?
            .clone();
        n.ensure_carrier(Carrier::new(
            carrier.clone(),
            costs.co2_emissions_for(carrier),
        ));

        let buses = match config.candidate_buses(region_setup, carrier) {
            Some(buses) => buses.clone(),
            None => n.bus_names(),
        };
        for bus in buses {
            if n.bus(&bus).is_none() {
                warn!("Candidate bus {} for {} does not exist", bus, carrier);
                continue;
            }
            n.add_generator(Generator {
                name: format!("{} {}", bus, carrier),
                bus,
                carrier: carrier.clone(),
                p_nom_extendable: true,
                efficiency: tech.efficiency,
                capital_cost: tech.capital_cost,
                marginal_cost: tech.marginal_cost,
                ..Default::default()
            });
        }
    }
    Ok(())
}

/// One extendable storage unit per candidate bus for every configured
/// storage carrier.
pub fn attach_storage(
    n: &mut Network,
    costs: &CostTable,
    config: &ModelConfig,
    region_setup: &str,
) -> Result<()> {
    let _timing = logging::start_timing(
        "attach_storage",
        OperationCategory::NetworkBuild {
            subcategory: BuildStage::Storage,
        },
    );

    let carriers = config.electricity.extendable_carriers.storage_unit.clone();
    for carrier in &carriers {
        let tech = costs
            .at(carrier)
            .with_context(|| format!("extendable storage carrier {}", carrier))?
            .clone();
        let max_hours = config
            .electricity
            .max_hours
            .get(carrier)
            .copied()
            .ok_or_else(|| anyhow!("no max_hours entry for {}", carrier))?;
        n.ensure_carrier(Carrier::new(
            carrier.clone(),
            costs.co2_emissions_for(carrier),
        ));

        let buses = match config.candidate_buses(region_setup, carrier) {
            Some(buses) => buses.clone(),
            None => n.bus_names(),
        };
        for bus in buses {
            if n.bus(&bus).is_none() {
                warn!("Candidate bus {} for {} does not exist", bus, carrier);
                continue;
            }
            n.add_storage_unit(StorageUnit {
                name: format!("{} {}", bus, carrier),
                bus,
                carrier: carrier.clone(),
                p_nom_extendable: true,
                max_hours,
                efficiency_store: tech.efficiency_store,
                efficiency_dispatch: tech.efficiency_dispatch,
                cyclic_state_of_charge: true,
                capital_cost: tech.capital_cost,
                marginal_cost: tech.marginal_cost,
                ..Default::default()
            });
        }
    }
    Ok(())
}
