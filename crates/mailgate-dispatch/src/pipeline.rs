//! Ordered, short-circuiting step pipeline.
//!
//! A pipeline executes a typed sequence of steps strictly in order. Each
//! step consumes the previous step's output and every step sees the same
//! shared execution context. The first failing step aborts the remainder
//! and its error is surfaced to the caller verbatim.
//!
//! The pipeline only sequences and forwards values. It does not retry,
//! run anything concurrently, or touch the values it threads through;
//! concurrent pipeline runs are fully independent.

use async_trait::async_trait;

use crate::prelude::*;

/// One unit of work in a pipeline.
///
/// `T` is the value threaded from step to step, `C` the shared execution
/// context injected into every step.
#[async_trait]
pub trait Step<T, C>: Send + Sync
where
	T: Send + 'static,
	C: Send + Sync,
{
	async fn execute(&self, input: T, ctx: &C) -> MgResult<T>;
}

/// An ordered sequence of steps sharing one execution context
pub struct Pipeline<T, C>
where
	T: Send + 'static,
	C: Send + Sync,
{
	steps: Vec<Box<dyn Step<T, C>>>,
}

impl<T, C> Pipeline<T, C>
where
	T: Send + 'static,
	C: Send + Sync,
{
	pub fn new() -> Self {
		Self { steps: Vec::new() }
	}

	/// Appends a step to the end of the pipeline
	pub fn step(mut self, step: impl Step<T, C> + 'static) -> Self {
		self.steps.push(Box::new(step));
		self
	}

	pub fn len(&self) -> usize {
		self.steps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Runs the steps in order, feeding each step's output into the next.
	///
	/// The first step receives `initial`. Short-circuits on the first
	/// `Err`, which is returned unchanged.
	pub async fn run(&self, initial: T, ctx: &C) -> MgResult<T> {
		let mut value = initial;
		for step in &self.steps {
			value = step.execute(value, ctx).await?;
		}
		Ok(value)
	}
}

impl<T, C> Default for Pipeline<T, C>
where
	T: Send + 'static,
	C: Send + Sync,
{
	fn default() -> Self {
		Self::new()
	}
}


// vim: ts=4
