//! Runs the classic allocate / release sequence against a fresh [`Heap`] and
//! prints the chain after each phase.
//!
//! ```text
//! RUST_LOG=debug cargo run --example scenario
//! ```

use firstfit::{AllocError, Heap};
use log::info;

/// Small payload written into the heap to show the memory is usable.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct Point {
    x: i32,
    y: i32,
}

fn main() -> Result<(), AllocError> {
    pretty_env_logger::init();

    let mut heap = Heap::new();

    let a1 = heap.allocate(100)?;
    let a2 = heap.allocate(200)?;
    heap.release(a1.as_ptr());

    let a3 = heap.allocate(50)?;
    info!("a1 = {a1:?}, a3 = {a3:?}, reused: {}", a1 == a3);

    let point = a3.cast::<Point>();
    unsafe { point.as_ptr().write(Point { x: 3, y: 4 }) };
    println!("stored {:?} at {point:?}", unsafe { point.as_ptr().read() });

    print!("{}", heap.dump());

    heap.release(a2.as_ptr());
    heap.release(a3.as_ptr());

    print!("{}", heap.dump());
    println!("{:?}", heap.stats());

    Ok(())
}
