/// Parallel processing utilities

pub fn configure_thread_pool(threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    let threads = if threads == 0 { num_cpus::get() } else { threads };

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
}
