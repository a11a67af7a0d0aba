//! Native Session Example
//!
//! Walks through one embedding session the way the native module drives
//! it: register a scripted component type, announce a graph with a few
//! objects, stage an init payload through the scratch arena, dispatch
//! updates, then tear everything down.
//!
//! Run with logging to watch the runtime's view of the session:
//! `RUST_LOG=debug cargo run --example native_session`

use tether::{
    ComponentHooks, ComponentRef, HookContext, HookFlags, PayloadWriter, PropValue, RefOffsets,
    Result, Runtime, RuntimeSettings, TypeDescriptor, WireValue,
};

const MANAGER: u32 = 0;

/// Integrates `angle` from `speed` every update dispatch.
struct SpinBehavior;

impl ComponentHooks for SpinBehavior {
    fn init(
        &mut self,
        rt: &mut Runtime,
        component: &ComponentRef,
        _ctx: &HookContext,
    ) -> Result<()> {
        let speed = rt.component_value(component, "speed")?.as_float().unwrap_or(0.0);
        log::info!("spin component {} ready at {speed} deg/s", component.raw_id());
        Ok(())
    }

    fn update(
        &mut self,
        rt: &mut Runtime,
        component: &ComponentRef,
        ctx: &HookContext,
    ) -> Result<()> {
        let angle = rt.component_value(component, "angle")?.as_float().unwrap_or(0.0);
        let speed = rt.component_value(component, "speed")?.as_float().unwrap_or(0.0);
        rt.set_component_value(component, "angle", PropValue::Float(angle + speed * ctx.delta))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut rt = Runtime::new(RuntimeSettings {
        expected_objects: 64,
        ..RuntimeSettings::default()
    });

    // The script side registers its component types once, up front.
    let descriptor = TypeDescriptor::from_json(
        r#"{
            "name": "Spin",
            "properties": {
                "angle": { "kind": "float" },
                "axis": { "kind": "vec3", "default": [0.0, 1.0, 0.0] },
                "speed": { "kind": "float", "default": 90.0 },
                "target": { "kind": "node" }
            }
        }"#,
    )?;
    let spin = rt
        .registry
        .register_with_hooks(
            descriptor,
            HookFlags::INIT | HookFlags::UPDATE,
            Box::new(|| Box::new(SpinBehavior) as Box<dyn ComponentHooks>),
        )?
        .get();

    // The native module announces a graph, three objects and one
    // component owned by object 1.
    let graph = rt.create_graph();
    rt.reserve_object_handles(graph, 3);
    rt.create_object(graph, 0, -1);
    rt.create_object(graph, 1, 0);
    rt.create_object(graph, 2, 0);
    rt.create_component(graph, MANAGER, 0, spin, 1);

    // Init payload: axis +Z, 45 deg/s, target raw id 3 biased to
    // object 2. Ids first, payload bytes right after, both staged
    // through the arena like the real handoff.
    let mut writer = PayloadWriter::new();
    writer.entry(&[
        WireValue::Omitted,
        WireValue::Vec3([0.0, 0.0, 1.0]),
        WireValue::Float(45.0),
        WireValue::Ref(3),
    ]);
    let payload = writer.finish();

    let ids = [0i32];
    let id_bytes = ids.len() * 4;
    rt.scratch().ints(ids.len()).copy_from_slice(&ids);
    rt.scratch().bytes(id_bytes + payload.len())[id_bytes..].copy_from_slice(&payload);
    let offsets = RefOffsets {
        node: -1,
        ..Default::default()
    };
    let applied = rt.init_components_staged(graph, MANAGER, ids.len(), payload.len(), offsets);
    println!("initialized {applied} component(s)");

    // One simulated second of update dispatches.
    for _ in 0..60 {
        rt.dispatch_update(1.0 / 60.0);
    }

    let component = rt
        .component(graph, MANAGER, 0)
        .ok_or_else(|| anyhow::anyhow!("component 0 missing"))?;
    let angle = rt.component_value(&component, "angle")?.as_float().unwrap_or(0.0);
    let owner = rt.component_owner(&component)?;
    let target = rt.component_value(&component, "target")?;
    let tracks = target
        .as_node()
        .is_some_and(|node| node.same(&rt.object(graph, 2).expect("object 2 missing")));

    println!("after {} dispatches ({:.2}s):", rt.dispatch_count(), rt.time());
    println!("  angle  = {angle:.2} deg");
    println!("  owner  = object {}", owner.id()?);
    println!("  target = object 2 resolved: {tracks}");

    // Teardown in native order: component first, then the whole graph.
    rt.destroy_component(graph, MANAGER, 0);
    rt.destroy_graph(graph)?;
    println!("graphs remaining: {}", rt.graph_count());

    Ok(())
}
