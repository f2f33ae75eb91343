use log::{debug, info, warn};
use tracereplay_trace::Trace;

/// Logs what the capture contains, once per load.
pub fn log_trace_summary(trace: &dyn Trace) {
    info!("Trace created: {}", trace.create_time().unwrap_or("unknown"));
    info!(
        "{} top level and {} bottom level acceleration structures",
        trace.top_level_count(),
        trace.bottom_level_count()
    );

    for blas in 0..trace.bottom_level_count() {
        match trace.bottom_level_info(blas) {
            Ok(info) => debug!(
                "BLAS {}: {} geometries, {} procedural nodes, {} triangle nodes, {} unique triangles, base address {:#x}",
                blas,
                info.geometry_count,
                info.procedural_node_count,
                info.triangle_node_count,
                info.unique_triangle_count,
                info.base_address
            ),
            Err(e) => warn!("BLAS {}: {}", blas, e),
        }
    }

    let dispatch_count = trace.dispatch_count();
    info!("{} recorded ray dispatches", dispatch_count);
    for dispatch in 0..dispatch_count {
        if let Ok(dimensions) = trace.dispatch_dimensions(dispatch) {
            debug!(
                "Dispatch {}: {}x{}x{}",
                dispatch, dimensions.width, dimensions.height, dimensions.depth
            );
        }
    }
}
