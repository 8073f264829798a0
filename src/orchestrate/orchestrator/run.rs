//! The combined training loop

use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConfigList, OptimizationConfig};
use crate::data::DataLoader;
use crate::distill::Distiller;
use crate::eval::evaluate;
use crate::model::SequenceClassifier;
use crate::optim::{AdamW, Optimizer};
use crate::orchestrate::{
    save_checkpoint, CompressionCallback, OptimizationError, OptimizationReport, OptimizedModel, PassContext,
    StepInfo, TrainingContext,
};
use crate::prune::PruningCallback;
use crate::quant::QuantizationCallback;
use crate::train::callback::CallbackAction;

use super::core::Orchestrator;
use super::state::LoopState;
use super::step::step_loss;

impl Orchestrator {
    /// Train `model` with every technique in `configs` applied together.
    ///
    /// The configs are validated against `ctx` first. Techniques compose in
    /// the fixed order pruning, distillation, quantization regardless of
    /// their position in the list. The returned model is checked to carry
    /// every requested technique; on any failure no model is returned.
    ///
    /// # Errors
    ///
    /// - [`ConfigError`] when the config list is rejected
    /// - [`OptimizationError::EmptyDataset`] when there is nothing to train on
    /// - [`OptimizationError::Diverged`] when the loss explodes
    /// - [`OptimizationError::MissingCalibrationData`] when quantization needs
    ///   calibration batches and gets none
    /// - [`OptimizationError::SparsityNotReached`] or
    ///   [`OptimizationError::TechniqueNotApplied`] when the final check fails
    pub fn optimize(
        &mut self,
        mut model: SequenceClassifier,
        ctx: &TrainingContext<'_>,
        configs: &ConfigList,
    ) -> crate::Result<OptimizedModel> {
        if ctx.train.is_empty() {
            return Err(OptimizationError::EmptyDataset.into());
        }
        configs.validate(ctx, &model, &self.args)?;

        let args = self.args.clone();
        let total_steps = args.total_steps(ctx.train.len());
        let steps_per_epoch = args.steps_per_epoch(ctx.train.len());
        info!(
            techniques = ?configs.techniques(),
            examples = ctx.train.len(),
            epochs = args.epochs,
            total_steps,
            seed = self.env.seed,
            "starting optimization"
        );

        let baseline_eval = match (&ctx.metric, &ctx.eval) {
            (Some(_), Some(eval)) => Some(evaluate(&model, eval, args.batch_size)?),
            _ => None,
        };

        let mut passes: Vec<Box<dyn CompressionCallback>> = Vec::new();
        let mut distiller = None;
        for config in configs.ordered() {
            match config {
                OptimizationConfig::Pruning(c) => passes.push(Box::new(PruningCallback::new(c.clone()))),
                OptimizationConfig::Distillation(c) => {
                    let teacher = ctx.teacher().ok_or(ConfigError::MissingTeacher)?;
                    distiller = Some(Distiller::new(teacher, c)?);
                }
                OptimizationConfig::Quantization(c) => passes.push(Box::new(QuantizationCallback::new(c.clone()))),
            }
        }

        let calibration = match configs.quantization() {
            Some(q) if q.requires_calibration() => ctx.calibration_batches(args.batch_size, q.calibration_batches())?,
            _ => Vec::new(),
        };
        let pass_ctx = PassContext { calibration: &calibration, total_steps };
        for pass in &mut passes {
            debug!(pass = pass.name(), "train begin");
            pass.on_train_begin(&mut model, &pass_ctx)?;
        }

        let mut optimizer = AdamW::default_params(args.learning_rate, args.weight_decay);
        let mut scheduler = args.lr_scheduler_type.build(args.learning_rate, args.warmup_steps, total_steps);
        let loader = DataLoader::new(&ctx.train, args.batch_size)?.with_shuffle(self.env.seed);
        let mut state = LoopState::new(args.epochs, steps_per_epoch, total_steps);

        if self.callbacks.on_train_begin(&state.context(0, 0, scheduler.get_lr(), &model)) == CallbackAction::Stop {
            state.stopped_early = true;
        }

        'epochs: for epoch in 0..args.epochs {
            if state.stopped_early {
                break;
            }
            match self.callbacks.on_epoch_begin(&state.context(epoch, 0, scheduler.get_lr(), &model)) {
                CallbackAction::Stop => {
                    state.stopped_early = true;
                    break;
                }
                CallbackAction::SkipEpoch => continue,
                CallbackAction::Continue => {}
            }

            let mut epoch_loss = 0.0;
            let mut epoch_steps = 0usize;
            for (step, batch) in loader.epoch(epoch).iter().enumerate() {
                let info = StepInfo { epoch, global_step: state.global_step, total_steps };
                for pass in &mut passes {
                    pass.on_step_begin(&mut model, &info)?;
                }

                let (logits, cache) = model.forward_train(batch);
                let (loss, grad_logits) = step_loss(distiller.as_mut(), batch, &logits);
                state.check_divergence(loss.total, args.divergence_factor)?;

                let mut grads = model.backward(batch, &cache, &grad_logits);
                for pass in &mut passes {
                    pass.on_gradients(&model, &grads);
                }
                if let Some(max_norm) = args.max_grad_norm {
                    grads.clip_norm(max_norm);
                }

                optimizer.begin_step();
                optimizer.set_lr(scheduler.get_lr());
                model.apply_gradients(&grads, &mut optimizer);
                scheduler.step();

                state.record(loss);
                epoch_loss += loss.total;
                epoch_steps += 1;
                debug!(step = state.global_step, loss = loss.total, task = loss.task, distill = ?loss.distill, "step");

                let info = StepInfo { epoch, global_step: state.global_step, total_steps };
                for pass in &mut passes {
                    pass.on_step_end(&mut model, &info)?;
                }

                if let Some(every) = args.save_steps {
                    if state.global_step.is_multiple_of(every) {
                        let dir = save_checkpoint(&model, &args.output_dir, &state.trainer_state(epoch, optimizer.lr()))?;
                        debug!(path = %dir.display(), "saved checkpoint");
                        state.checkpoints.push(dir);
                    }
                }

                match self.callbacks.on_step_end(&state.context(epoch, step, optimizer.lr(), &model)) {
                    CallbackAction::Stop => {
                        state.stopped_early = true;
                        break 'epochs;
                    }
                    CallbackAction::SkipEpoch => break,
                    CallbackAction::Continue => {}
                }
            }

            state.finish_epoch(if epoch_steps > 0 { epoch_loss / epoch_steps as f32 } else { 0.0 });

            if let Some(eval) = &ctx.eval {
                state.eval = Some(evaluate(&model, eval, args.batch_size)?);
                if self.callbacks.on_evaluate(&state.context(epoch, epoch_steps, optimizer.lr(), &model))
                    == CallbackAction::Stop
                {
                    state.stopped_early = true;
                    break;
                }
            }

            if self.callbacks.on_epoch_end(&state.context(epoch, epoch_steps, optimizer.lr(), &model))
                == CallbackAction::Stop
            {
                state.stopped_early = true;
            }
        }

        let end = StepInfo { epoch: state.epochs_completed, global_step: state.global_step, total_steps };
        for pass in &mut passes {
            pass.on_train_end(&mut model, &end)?;
        }
        self.callbacks.on_train_end(&state.context(state.epochs_completed, 0, optimizer.lr(), &model));

        let mut techniques = Vec::with_capacity(passes.len() + 1);
        for pass in &passes {
            techniques.push(pass.verify(&model, args.sparsity_tolerance)?);
        }
        if let Some(distiller) = &distiller {
            techniques.push(distiller.applied()?);
        }
        techniques.sort_by_key(|t| t.technique.rank());

        let eval = match &ctx.eval {
            Some(eval) => Some(evaluate(&model, eval, args.batch_size)?),
            None => None,
        };

        let report = OptimizationReport {
            techniques,
            sparsity: model.sparsity_by_layer(),
            loss_history: state.loss_history,
            steps: state.global_step,
            epochs_completed: state.epochs_completed,
            stopped_early: state.stopped_early,
            checkpoints: state.checkpoints,
            eval,
            baseline_eval,
        };

        if let Some(comparison) = ctx.metric.as_ref().and_then(|m| report.compare(m)) {
            if comparison.accepted {
                info!(
                    baseline = comparison.baseline,
                    candidate = comparison.candidate,
                    degradation = comparison.degradation,
                    "metric within criterion"
                );
            } else {
                warn!(
                    baseline = comparison.baseline,
                    candidate = comparison.candidate,
                    degradation = comparison.degradation,
                    "metric outside criterion"
                );
            }
        }

        let optimized = OptimizedModel::new(model, report);
        if let Some(dir) = &args.final_model_dir {
            optimized
                .save_pretrained(dir)
                .map_err(|source| OptimizationError::Checkpoint { path: dir.clone(), source })?;
            info!(path = %dir.display(), "saved optimized model");
        }

        info!(
            steps = optimized.report().steps,
            final_loss = ?optimized.report().final_loss(),
            classifier = optimized.model().classifier().type_name(),
            "optimization finished"
        );
        Ok(optimized)
    }
}
