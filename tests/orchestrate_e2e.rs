//! End-to-end orchestration on a small SST-2 style sentiment set
//!
//! Mirrors the reference scenario: 30 training sentences reused for eval and
//! calibration, a briefly fine-tuned teacher, pruning to 0.64 over steps
//! 0..=2, CE+KL distillation and default quantization-aware training.

use orquestar::config::{ConfigList, Technique};
use orquestar::data::{DataLoader, Dataset, HashingTokenizer, TokenizerOptions};
use orquestar::distill::{DistillationConfig, DistillationLossKind, KnowledgeDistillationLossConfig};
use orquestar::eval::{evaluate, Metric};
use orquestar::model::{ModelConfig, ModelHub, SequenceClassifier, PRE_CLASSIFIER};
use orquestar::optim::{AdamW, Optimizer};
use orquestar::orchestrate::{Orchestrator, RunEnvironment, TrainingContext, REPORT_FILE};
use orquestar::prune::{PruningConfig, PruningScope};
use orquestar::quant::QuantizationConfig;
use orquestar::train::{cross_entropy, TrainingArgs};

const SST2: [(&str, usize); 30] = [
    ("hide new secretions from the parental units", 0),
    ("contains no wit , only labored gags", 0),
    ("that loves its characters and communicates something rather beautiful about human nature", 1),
    ("remains utterly satisfied to remain the same throughout", 0),
    ("on the worst revenge-of-the-nerds cliches the filmmakers could dredge up", 0),
    ("that 's far too tragic to merit such superficial treatment", 0),
    ("demonstrates that the director of such hollywood blockbusters as patriot games can still turn out a small , personal film with an emotional wallop", 1),
    ("of saucy", 1),
    ("a depressed fifteen-year-old 's suicidal poetry", 0),
    ("are more deeply thought through than in most ` right-thinking ' films", 1),
    ("goes to absurd lengths", 0),
    ("for those moviegoers who complain that ` they do n't make movies like they used to anymore", 0),
    ("the part where nothing 's happening ,", 0),
    ("saw how bad this movie was", 0),
    ("lend some dignity to a dumb story", 0),
    ("the greatest musicians", 1),
    ("cold movie", 0),
    ("with his usual intelligence and subtlety", 1),
    ("redundant concept", 0),
    ("swimming is above all about a young woman 's face , and by casting an actress whose face projects that woman 's doubts and yearnings , it succeeds", 1),
    ("equals the original and in some ways even betters it", 1),
    ("if anything , see it for karen black , who camps up a storm as a fringe feminist conspiracy theorist named dirty dick", 1),
    ("a smile on your face", 1),
    ("comes from the brave , uninhibited performances", 1),
    ("excruciatingly unfunny and pitifully unromantic", 0),
    ("enriched by an imaginatively mixed cast of antic spirits", 1),
    ("which half of dragonfly is worse : the part where nothing 's happening , or the part where something 's happening", 0),
    ("in world cinema", 1),
    ("very good viewing alternative", 1),
    ("the plot is nothing but boilerplate cliches from start to finish ,", 0),
];

fn sst2() -> Dataset {
    Dataset::from_texts(SST2, &HashingTokenizer::new(4096), &TokenizerOptions::default()).unwrap()
}

fn student() -> SequenceClassifier {
    SequenceClassifier::new(ModelConfig::default(), 42).unwrap()
}

/// A few plain cross-entropy epochs so the teacher has learned something
fn fine_tuned_teacher(data: &Dataset) -> SequenceClassifier {
    let mut teacher = SequenceClassifier::new(ModelConfig::default(), 7).unwrap();
    let mut optimizer = AdamW::default_params(5e-3, 0.0);
    let loader = DataLoader::new(data, 8).unwrap().with_shuffle(0);
    for epoch in 0..10 {
        for batch in loader.epoch(epoch) {
            let (logits, cache) = teacher.forward_train(&batch);
            let (_, grad) = cross_entropy(&logits, &batch.labels);
            let grads = teacher.backward(&batch, &cache, &grad);
            optimizer.begin_step();
            teacher.apply_gradients(&grads, &mut optimizer);
        }
    }
    teacher
}

fn configs() -> ConfigList {
    ConfigList::new()
        .with(
            PruningConfig::default()
                .with_window(0, 2)
                .with_target_sparsity(0.64)
                .with_scope(PruningScope::Local),
        )
        .with(DistillationConfig::new(
            KnowledgeDistillationLossConfig::default()
                .with_loss_types(DistillationLossKind::CE, DistillationLossKind::KL),
        ))
        .with(QuantizationConfig::default())
}

fn args(root: &std::path::Path) -> TrainingArgs {
    TrainingArgs::default()
        .with_learning_rate(1e-3)
        .with_output_dir(root.join("tmp_trainer"))
        .with_final_model_dir(root.join("orchestrate_optimizations_model"))
}

#[test]
fn orchestrate_prune_distill_quantize() {
    let tmp = tempfile::tempdir().unwrap();
    let data = sst2();
    let teacher = fine_tuned_teacher(&data);
    let teacher_eval = evaluate(&teacher, &data, 8).unwrap();

    let metric = Metric::new("eval_accuracy", true, 0.5);
    let ctx = TrainingContext::new(data.clone())
        .with_eval(data.clone())
        .with_calibration(data)
        .with_metric(metric.clone())
        .with_teacher(&teacher);

    let env = RunEnvironment::default().with_seed(42).with_external_reporting(false);
    let mut orchestrator = Orchestrator::new(env, args(tmp.path()));
    let optimized = orchestrator.optimize(student(), &ctx, &configs()).unwrap();

    let model = optimized.model();
    assert!(model.classifier().type_name().contains("quantize"));
    assert!(model.pre_classifier().type_name().contains("quantize"));
    let sparsity = model.layer(PRE_CLASSIFIER).unwrap().linear().sparsity();
    assert!((sparsity - 0.64).abs() <= 0.02, "sparsity {sparsity}");

    let report = optimized.report();
    // 30 examples, batch 8, 3 epochs
    assert_eq!(report.steps, 12);
    assert!(report.applied(Technique::Pruning).is_some());
    assert!(report.applied(Technique::Distillation).is_some());
    assert!(report.applied(Technique::Quantization).is_some());
    assert!(report.loss_history.iter().all(|l| l.is_finite()));
    assert!(report.compare(&metric).is_some());

    // Teacher was only read
    assert_eq!(evaluate(&teacher, ctx.eval.as_ref().unwrap(), 8).unwrap(), teacher_eval);
    assert!(!teacher.classifier().is_quantized());

    let saved = tmp.path().join("orchestrate_optimizations_model");
    assert!(saved.join(REPORT_FILE).is_file());
    let reloaded = SequenceClassifier::from_pretrained(&saved).unwrap();
    assert!(reloaded.classifier().type_name().contains("quantize"));
}

#[test]
fn fresh_copies_get_the_same_structure() {
    let data = sst2();
    let teacher = fine_tuned_teacher(&data);
    let ctx = TrainingContext::new(data.clone()).with_calibration(data).with_teacher(&teacher);

    let run = |root: &std::path::Path| {
        let env = RunEnvironment::default().with_external_reporting(false);
        let args = args(root).with_final_model_dir(root.join("out"));
        Orchestrator::new(env, args).optimize(student(), &ctx, &configs()).unwrap()
    };
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let first = run(a.path());
    let second = run(b.path());

    assert_eq!(first.report().techniques, second.report().techniques);
    assert_eq!(first.report().loss_history, second.report().loss_history);
    assert_eq!(
        first.model().pre_classifier().linear().mask(),
        second.model().pre_classifier().linear().mask()
    );
    assert_eq!(first.model().classifier().type_name(), second.model().classifier().type_name());
}

#[test]
fn student_loaded_from_the_hub() {
    let tmp = tempfile::tempdir().unwrap();
    let hub = ModelHub::new(tmp.path().join("models"));
    let data = sst2();
    hub.save("distilbert-base-uncased", &student()).unwrap();
    hub.save("distilbert-base-uncased-finetuned-sst-2-english", &fine_tuned_teacher(&data)).unwrap();

    let student = hub.load("distilbert-base-uncased").unwrap();
    let teacher = hub.load("distilbert-base-uncased-finetuned-sst-2-english").unwrap();
    let ctx = TrainingContext::new(data.clone()).with_eval(data.clone()).with_calibration(data).with_teacher(&teacher);

    let env = RunEnvironment::default().with_external_reporting(false);
    let optimized = Orchestrator::new(env, args(tmp.path())).optimize(student, &ctx, &configs()).unwrap();
    assert!(optimized.model().classifier().type_name().contains("quantize"));
    assert!(hub.load("missing-model").is_err());
}
