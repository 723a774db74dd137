use super::{ChartSpec, MetricViewer, Series};

pub const VGCNUM: &str = "gcnum";
pub const VHEAP: &str = "heap memory";
pub const VHEAP_OBJECTS: &str = "heap objects";
pub const VSTACK: &str = "stack memory";
pub const VOFF_HEAP: &str = "off heap memory";

const MB_FORMATTER: &str = "{value} MB";

/// Reclaim cycle counts.
pub fn gc_num() -> MetricViewer {
    MetricViewer::new(
        VGCNUM,
        ChartSpec::stacked_area(VGCNUM, "GC Number").with_y_axis("Num", None),
        vec![
            Series::count("GcNum", |s| s.num_gc),
            Series::count("ForcedGcNum", |s| s.num_forced_gc),
        ],
    )
}

pub fn heap_memory() -> MetricViewer {
    MetricViewer::new(
        VHEAP,
        ChartSpec::stacked_area(VHEAP, "Heap Memory").with_y_axis("Size", Some(MB_FORMATTER)),
        vec![
            Series::megabytes("HeapAlloc", |s| s.heap_alloc),
            Series::megabytes("HeapInuse", |s| s.heap_inuse),
            Series::megabytes("HeapSys", |s| s.heap_sys),
            Series::megabytes("HeapIdle", |s| s.heap_idle),
            Series::megabytes("HeapReleased", |s| s.heap_released),
        ],
    )
}

pub fn heap_objects() -> MetricViewer {
    MetricViewer::new(
        VHEAP_OBJECTS,
        ChartSpec::stacked_area(VHEAP_OBJECTS, "Heap Objects").with_y_axis("Number", None),
        vec![Series::count("HeapObjects", |s| s.heap_objects)],
    )
}

pub fn stack_memory() -> MetricViewer {
    MetricViewer::new(
        VSTACK,
        ChartSpec::stacked_area(VSTACK, "Stack Memory").with_y_axis("Size", Some(MB_FORMATTER)),
        vec![
            Series::megabytes("StackSys", |s| s.stack_sys),
            Series::megabytes("StackInuse", |s| s.stack_inuse),
        ],
    )
}

/// Allocator metadata held outside the heap proper.
pub fn off_heap_memory() -> MetricViewer {
    MetricViewer::new(
        VOFF_HEAP,
        ChartSpec::stacked_area(VOFF_HEAP, "OFF HEAP Memory")
            .with_y_axis("Size", Some(MB_FORMATTER)),
        vec![
            Series::megabytes("MCacheInuse", |s| s.mcache_inuse),
            Series::megabytes("MCacheSys", |s| s.mcache_sys),
            Series::megabytes("MSpanSys", |s| s.mspan_sys),
            Series::megabytes("MSpanInuse", |s| s.mspan_inuse),
        ],
    )
}

/// Every built-in viewer, in dashboard order.
pub fn default_viewers() -> Vec<MetricViewer> {
    vec![
        gc_num(),
        heap_memory(),
        heap_objects(),
        stack_memory(),
        off_heap_memory(),
    ]
}

pub fn viewer_by_name(name: &str) -> Option<MetricViewer> {
    match name {
        VGCNUM => Some(gc_num()),
        VHEAP => Some(heap_memory()),
        VHEAP_OBJECTS => Some(heap_objects()),
        VSTACK => Some(stack_memory()),
        VOFF_HEAP => Some(off_heap_memory()),
        _ => None,
    }
}
