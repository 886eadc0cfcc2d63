//! The render / compare / patch loop.
//!
//! A run acquires the reference once, then repeatedly renders the candidate,
//! compares it against the cached reference and, on a mismatch, patches the
//! component's root rule and waits for the change to settle. The iteration cap
//! bounds the loop regardless of how large the remaining difference is.

use crate::error::{AcquisitionError, ConvergenceError, FailureKind};
use crate::ids::{ComponentId, DEFAULT_VIEWPORT, DesignId, IntrinsicSize, Viewport};
use crate::options::ConvergenceOptions;
use crate::ports::{CandidateRenderer, ReferenceImage, ReferenceImageProvider, StyleSource};
use crate::report::{FinalReport, IterationSummary};
use crate::state::{ConvergenceState, IterationRecord, RunStatus};
use core::future::{Future, pending};
use core::mem;
use core::time::Duration;
use log::{debug, error, info, warn};
use raster_diff::ImageComparator;
use style_patch::{Correction, PatchAdvisor, PatchError, root_selector};
use tokio::time::sleep;

/// Drives one component towards its reference design.
///
/// Runs are strictly sequential: each render depends on the style write of
/// the iteration before it.
pub struct ConvergenceController<P, R, S> {
    provider: P,
    renderer: R,
    style_source: S,
    advisor: PatchAdvisor,
    options: ConvergenceOptions,
    state: ConvergenceState,
}

impl<P, R, S> ConvergenceController<P, R, S>
where
    P: ReferenceImageProvider,
    R: CandidateRenderer,
    S: StyleSource,
{
    pub fn new(provider: P, renderer: R, style_source: S, options: ConvergenceOptions) -> Self {
        Self {
            provider,
            renderer,
            style_source,
            advisor: PatchAdvisor,
            options,
            state: ConvergenceState::default(),
        }
    }

    pub const fn options(&self) -> &ConvergenceOptions {
        &self.options
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    pub const fn style_source(&self) -> &S {
        &self.style_source
    }

    pub fn into_parts(self) -> (P, R, S) {
        (self.provider, self.renderer, self.style_source)
    }

    /// Run to completion.
    pub async fn invoke(&mut self, component: &str, design: &str) -> FinalReport {
        self.invoke_with_cancel(component, design, pending::<String>())
            .await
    }

    /// Run, aborting once `limit` has elapsed.
    pub async fn invoke_with_timeout(
        &mut self,
        component: &str,
        design: &str,
        limit: Duration,
    ) -> FinalReport {
        let deadline = async move {
            sleep(limit).await;
            format!("timed out after {limit:?}")
        };
        self.invoke_with_cancel(component, design, deadline).await
    }

    /// Run until finished or until `cancel` resolves; its output becomes the
    /// abort reason. Either way a complete report is returned, covering the
    /// iterations measured so far.
    pub async fn invoke_with_cancel<C>(
        &mut self,
        component: &str,
        design: &str,
        cancel: C,
    ) -> FinalReport
    where
        C: Future<Output = String>,
    {
        self.state = ConvergenceState::default();
        info!(
            "validating `{component}` against design `{design}` (threshold {:.2}%, max {} iterations)",
            self.options.match_threshold * 100.0,
            self.options.iteration_cap
        );

        let outcome = tokio::select! {
            outcome = self.drive(component, design) => outcome,
            reason = cancel => Err(ConvergenceError::Cancelled(reason)),
        };

        let state = mem::take(&mut self.state);
        self.finish(component, design, state, outcome)
    }

    async fn drive(&mut self, component: &str, design: &str) -> Result<RunStatus, ConvergenceError> {
        let component = ComponentId::parse(component)?;
        let design = DesignId::parse(design)?;
        self.options.validate()?;
        self.state.transition(RunStatus::Running);

        let reference =
            Self::cached_reference(&mut self.provider, &mut self.state.reference, &design).await?;
        let viewport = viewport_for(reference);
        debug!("rendering at {}x{}", viewport.width, viewport.height);

        let comparator =
            ImageComparator::new(self.options.match_threshold, self.options.channel_tolerance);
        let cap = self.options.iteration_cap;

        for index in 1..=cap {
            info!("iteration {index}/{cap}");
            let candidate = self
                .renderer
                .render(&component, &self.options.variant, viewport)
                .await
                .map_err(AcquisitionError::Candidate)?;
            let comparison = comparator.compare(&reference.raster, &candidate)?;
            let matched = comparison.matched;
            let diff_ratio = comparison.diff_ratio;
            self.state.records.push(IterationRecord {
                index,
                comparison,
                corrections_applied: Vec::new(),
            });

            if matched {
                return Ok(RunStatus::Converged);
            }
            if index == cap {
                return Ok(RunStatus::Exhausted);
            }

            let applied = patch_style_source(
                &self.advisor,
                &mut self.style_source,
                &component,
                diff_ratio,
            )?;
            if let Some(record) = self.state.records.last_mut() {
                record.corrections_applied = applied;
            }

            info!(
                "waiting {:?} for the style change to settle",
                self.options.settle_duration
            );
            sleep(self.options.settle_duration).await;
        }

        Ok(RunStatus::Exhausted)
    }

    /// Fetch the reference on first use; later calls return the cached value.
    async fn cached_reference<'slot>(
        provider: &mut P,
        slot: &'slot mut Option<ReferenceImage>,
        design: &DesignId,
    ) -> Result<&'slot ReferenceImage, ConvergenceError> {
        let image = match slot.take() {
            Some(cached) => {
                debug!("reusing cached reference for `{design}`");
                cached
            }
            None => {
                let fetched = provider
                    .fetch(design)
                    .await
                    .map_err(AcquisitionError::Reference)?;
                info!(
                    "reference `{design}` acquired: {}x{}",
                    fetched.raster.width(),
                    fetched.raster.height()
                );
                fetched
            }
        };
        Ok(slot.insert(image))
    }

    fn finish(
        &self,
        component: &str,
        design: &str,
        mut state: ConvergenceState,
        outcome: Result<RunStatus, ConvergenceError>,
    ) -> FinalReport {
        let (status, error) = match outcome {
            Ok(status) => (status, None),
            Err(err) => (RunStatus::Aborted, Some(err)),
        };
        state.transition(status);

        let final_diff_ratio = state
            .last_record()
            .map(|record| record.comparison.diff_ratio);
        let iterations_run = state.iterations_run();
        let percent = final_diff_ratio.unwrap_or(1.0) * 100.0;

        let reason = match (&error, status) {
            (Some(err), _) => err.to_string(),
            (None, RunStatus::Converged) => format!(
                "matched: {percent:.2}% difference is below the {:.2}% threshold",
                self.options.match_threshold * 100.0
            ),
            (None, _) => format!(
                "iteration cap of {} reached with {percent:.2}% difference remaining",
                self.options.iteration_cap
            ),
        };
        let failure = match (&error, status) {
            (Some(err), _) => Some(err.kind()),
            (None, RunStatus::Exhausted) => Some(FailureKind::Exhausted),
            (None, _) => None,
        };

        match status {
            RunStatus::Converged => info!("`{component}` converged after {iterations_run} iteration(s): {reason}"),
            RunStatus::Exhausted => warn!("`{component}` did not converge: {reason}"),
            _ => error!("`{component}` aborted after {iterations_run} iteration(s): {reason}"),
        }

        FinalReport {
            component: component.to_owned(),
            design: design.to_owned(),
            status: state.status(),
            final_diff_ratio,
            iterations_run,
            iteration_cap: self.options.iteration_cap,
            match_threshold: self.options.match_threshold,
            reason,
            failure,
            iterations: state
                .records
                .into_iter()
                .map(IterationSummary::from)
                .collect(),
            error,
        }
    }
}

/// Read the style source, merge the advised corrections and write it back.
fn patch_style_source<S: StyleSource>(
    advisor: &PatchAdvisor,
    source: &mut S,
    component: &ComponentId,
    diff_ratio: f64,
) -> Result<Vec<Correction>, PatchError> {
    let css = source
        .read(component)
        .map_err(|err| PatchError::StyleSource(err.to_string()))?;
    let patch = advisor.patch(diff_ratio, &root_selector(component.as_str()), &css)?;
    source
        .write(component, &patch.stylesheet_text)
        .map_err(|err| PatchError::StyleSource(err.to_string()))?;
    for correction in &patch.applied {
        info!("  - {correction}");
    }
    info!("applied {} correction(s) to `{component}`", patch.applied.len());
    Ok(patch.applied)
}

/// Viewport a reference implies: its intrinsic size plus overflow padding,
/// or the default when the provider reported none.
pub fn viewport_for(reference: &ReferenceImage) -> Viewport {
    reference
        .intrinsic_size
        .map_or(DEFAULT_VIEWPORT, IntrinsicSize::to_viewport)
}
