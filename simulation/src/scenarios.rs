//! Pre-defined roster scenarios
//!
//! Each scenario prints the panel after every step and returns the finished
//! simulation so tests can inspect it.

use huddle_core::ParticipantId;
use huddle_panel::PanelConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::simulation::{ChurnConfig, RosterSim, SimResult};

const NAMES: [&str; 8] = ["Ada", "Bo", "Cy", "Dee", "Eve", "Fin", "Gus", "Hal"];

fn name_of(participant: ParticipantId) -> &'static str {
    NAMES[(participant.as_u64() as usize).saturating_sub(1) % NAMES.len()]
}

fn print_step(sim: &RosterSim, title: &str) {
    println!("\n--- {} ---", title);
    println!("  {}", sim.state_summary());
    println!("{}", sim.render_panel());
}

/// Pool exhaustion and promotion:
///
/// ```text
/// N slots, N+1 participants join in order
/// The last joiner is tracked but not shown
/// The first joiner leaves
/// The longest-waiting participant takes the freed slot
/// ```
pub fn run_overflow_scenario(config: PanelConfig) -> SimResult<RosterSim> {
    info!("=== Running Overflow Scenario ===");
    let slots = config.max_display_slots;
    let mut sim = RosterSim::new(config)?;

    println!("\n--- Step 1: {} participants join a panel of {} ---", slots + 1, slots);
    for participant in ParticipantId::range(1, slots + 1) {
        sim.join(participant, name_of(participant));
        sim.session.set_amplitude(participant, 0.2);
    }
    sim.step()?;
    println!("  {}", sim.state_summary());
    println!("{}", sim.render_panel());

    let first = ParticipantId(1);
    sim.leave(first);
    sim.step()?;
    print_step(&sim, "Step 2: the first participant leaves");

    sim.run_ticks(2)?;
    print_step(&sim, "Step 3: steady state");

    print_stats(&sim);
    Ok(sim)
}

/// Source dropout:
///
/// ```text
/// A participant is displayed and speaking with video
/// Their source vanishes without a leave
/// The slot shows silence and no video but stays assigned
/// The source respawns and the slot recovers on the next tick
/// ```
pub fn run_dropout_scenario(config: PanelConfig) -> SimResult<RosterSim> {
    info!("=== Running Dropout Scenario ===");
    let mut sim = RosterSim::new(config)?;
    let ada = ParticipantId(1);

    sim.join(ada, name_of(ada));
    sim.spawn_video(ada);
    sim.set_amplitude(ada, 0.6);
    sim.step()?;
    print_step(&sim, "Step 1: Ada speaks with video");

    sim.lose_source(ada);
    sim.step()?;
    print_step(&sim, "Step 2: Ada's source is lost");

    sim.run_ticks(3)?;
    print_step(&sim, "Step 3: still lost, slot kept");

    sim.restore_source(ada);
    sim.step()?;
    print_step(&sim, "Step 4: Ada's source respawns");

    print_stats(&sim);
    Ok(sim)
}

/// Late video:
///
/// ```text
/// A participant joins before their capture camera produced a surface
/// The surface appears a few ticks later
/// The slot binds it exactly once
/// ```
pub fn run_late_video_scenario(config: PanelConfig) -> SimResult<RosterSim> {
    info!("=== Running Late Video Scenario ===");
    let mut sim = RosterSim::new(config)?;
    let bo = ParticipantId(2);

    sim.join(bo, name_of(bo));
    sim.run_ticks(2)?;
    print_step(&sim, "Step 1: Bo joined without video");

    sim.spawn_video(bo);
    let report = sim.step()?;
    print_step(&sim, "Step 2: Bo's video surface appears");
    println!("  video bound this tick: {}", report.video_bound);

    sim.run_ticks(3)?;
    print_step(&sim, "Step 3: no rebinding");
    println!("  total attaches: {}", sim.render.attaches());

    print_stats(&sim);
    Ok(sim)
}

/// Random churn with a fixed seed, checking the slot cap every tick
pub fn run_churn_scenario(config: PanelConfig, ticks: u64, seed: u64) -> SimResult<RosterSim> {
    info!("=== Running Churn Scenario ({} ticks, seed {}) ===", ticks, seed);
    let mut sim = RosterSim::new(config)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let churn = ChurnConfig::default();

    let report_every = (ticks / 5).max(1);
    for _ in 0..ticks {
        sim.random_round(&mut rng, &churn);
        sim.step()?;
        if sim.tick.is_multiple_of(report_every) {
            println!("{}", sim.state_summary());
        }
    }

    print_step(&sim, "Final panel");
    print_stats(&sim);
    Ok(sim)
}

fn print_stats(sim: &RosterSim) {
    let stats = &sim.stats;
    println!("\n=== Final Statistics ===");
    println!("  Ticks: {}", stats.ticks);
    println!("  Joins: {}", stats.joins);
    println!("  Leaves: {}", stats.leaves);
    println!("  Sources lost: {}", stats.source_losses);
    println!("  Sources restored: {}", stats.source_restores);
    println!("  Renames: {}", stats.renames);
    println!("  Max displayed: {}", stats.max_bound);
    println!("  Max waiting: {}", stats.max_waiting);
    println!("  Slot refreshes: {}", stats.sync.updated);
    println!("  Degraded refreshes: {}", stats.sync.degraded);
    println!("  Video binds: {}", stats.sync.video_bound);
    println!("  Live render targets: {}", sim.render.live());
}
