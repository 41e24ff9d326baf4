//! 控制器集成测试
//!
//! 以单线程方式逐周期驱动 `WholebodyController`，验证：
//! 1. 模式互斥，被拒绝的命令不改变 (mode, balance)
//! 2. 增益比例在 [0, 1] 内，渐变期间单调
//! 3. 地面反力调度与传感器限幅的数值
//! 4. 逆解失败时在同一周期中止
//! 5. 关节运动、躯干偏移 + 复位、完整步行

use nalgebra::Vector3;
use proptest::prelude::*;
use wbc_sdk::control::balance::{BalanceController, BalanceInput, BalanceOutput};
use wbc_sdk::control::grf::schedule;
use wbc_sdk::control::sensor::{FORCE_LIMIT, TORQUE_LIMIT, level_orientation, saturate};
use wbc_sdk::prelude::*;

const CYCLE: f64 = 0.008;
/// 1 秒对应的周期数
const ONE_SECOND: usize = 126;

fn level_input() -> TickInput {
    TickInput {
        sensors: SensorFrame {
            imu: ImuSample {
                orientation: level_orientation(),
                ..ImuSample::default()
            },
            ..SensorFrame::default()
        },
        ..TickInput::default()
    }
}

fn run(controller: &mut WholebodyController, ticks: usize) -> Vec<ControlEvent> {
    let input = level_input();
    (0..ticks)
        .flat_map(|_| controller.tick(&input).events)
        .collect()
}

fn balance(controller: &mut WholebodyController, token: BalanceToken) {
    controller
        .handle_command(ControlCommand::Balance { token, gains: None })
        .unwrap();
}

fn footstep(direction: StepDirection, step_num: u32) -> FootStepCommand {
    FootStepCommand {
        direction,
        step_num,
        step_time: 0.5,
        step_length: 0.02,
        side_step_length: 0.01,
        step_angle: 0.1,
    }
}

// ==================== 数值 ====================

#[test]
fn test_grf_reference_values() {
    let dsp = schedule(3.5, (0.0, 0.0), WalkingPhase::Dsp, Leg::Left);
    assert!((dsp.left.force.z + 17.1675).abs() < 1e-9);
    assert!((dsp.right.force.z + 17.1675).abs() < 1e-9);

    let ssp = schedule(3.5, (0.0, 0.0), WalkingPhase::Ssp, Leg::Left);
    assert!((ssp.left.force.z + 34.335).abs() < 1e-9);
    assert_eq!(ssp.right.force.z, 0.0);
    assert!((ssp.left.force.z + ssp.right.force.z + 34.335).abs() < 1e-9);
}

#[test]
fn test_sensor_saturation() {
    assert_eq!(
        saturate(Vector3::new(2500.0, -10.0, 0.0), FORCE_LIMIT),
        Vector3::new(2000.0, -10.0, 0.0)
    );
    assert_eq!(
        saturate(Vector3::new(0.0, -350.0, 5.0), TORQUE_LIMIT),
        Vector3::new(0.0, -300.0, 5.0)
    );

    // 入站足底力经旋转后限幅
    let frame = SensorFrame::from_raw(
        ImuSample::default(),
        Wrench::new(Vector3::new(0.0, 0.0, 2500.0), Vector3::zeros()),
        Wrench::zero(),
    );
    assert!((frame.feet.left.force.z + FORCE_LIMIT).abs() < 1e-9);
}

// ==================== 运动 ====================

#[test]
fn test_joint_pose_r_knee() {
    let mut controller = WholebodyController::new(ControllerConfig::default());
    let goal = JointPoseGoal::from_names([("r_knee", 0.5)], 1.0).unwrap();
    controller
        .handle_command(ControlCommand::JointPose(goal))
        .unwrap();

    let events = run(&mut controller, ONE_SECOND);

    assert_eq!(controller.mode(), ControlMode::None);
    assert_eq!(controller.desired_joints()[Joint::RKnee], 0.5);
    assert!(events.contains(&ControlEvent::MovementDone(ControlMode::Joint)));
}

#[test]
fn test_body_offset_then_reset() {
    let mut controller = WholebodyController::new(ControllerConfig::default());
    balance(&mut controller, BalanceToken::On);
    run(&mut controller, ONE_SECOND);

    controller
        .handle_command(ControlCommand::BodyOffset(BodyOffset::new(0.01, -0.01, -0.005)))
        .unwrap();
    let events = run(&mut controller, ONE_SECOND);
    assert!(events.contains(&ControlEvent::MovementDone(ControlMode::Offset)));
    assert_eq!(
        controller.desired().body_offset,
        Vector3::new(0.01, -0.01, -0.005)
    );

    controller.handle_command(ControlCommand::ResetBody).unwrap();
    assert_eq!(controller.desired().body_offset, Vector3::zeros());
    assert_eq!(
        controller.desired().stance,
        StancePoses::nominal(controller.foot_distance())
    );
    assert_eq!(controller.walking_param().zmp_offset_x, 0.0);
}

#[test]
fn test_foot_distance_applies_on_reset() {
    let mut controller = WholebodyController::new(ControllerConfig::default());
    controller
        .handle_command(ControlCommand::FootDistance(0.09))
        .unwrap();
    controller.handle_command(ControlCommand::ResetBody).unwrap();

    assert_eq!(controller.task_pose(TaskGroup::LeftLeg).position.y, 0.045);
    assert_eq!(controller.task_pose(TaskGroup::RightLeg).position.y, -0.045);
}

#[test]
fn test_walking_rejected_without_balance() {
    let mut controller = WholebodyController::new(ControllerConfig::default());
    run(&mut controller, 1);

    let err = controller
        .handle_command(ControlCommand::FootStep {
            command: footstep(StepDirection::Forward, 2),
            preview: None,
        })
        .unwrap_err();
    assert!(matches!(err, ControlError::CommandRejected { .. }));
    assert_eq!(controller.mode(), ControlMode::None);
    assert_eq!(controller.balance(), BalanceMode::Off);
}

#[test]
fn test_walking_rejected_while_offset_active() {
    let mut controller = WholebodyController::new(ControllerConfig::default());
    balance(&mut controller, BalanceToken::On);
    run(&mut controller, ONE_SECOND);

    controller
        .handle_command(ControlCommand::BodyOffset(BodyOffset::new(0.01, 0.0, 0.0)))
        .unwrap();
    run(&mut controller, 10);

    let err = controller
        .handle_command(ControlCommand::FootStep {
            command: footstep(StepDirection::Forward, 2),
            preview: None,
        })
        .unwrap_err();
    assert_eq!(
        err,
        ControlError::CommandRejected {
            command: "foot_step",
            reason: "[WARN] Control type is different!".to_string(),
        }
    );
    assert_eq!(controller.mode(), ControlMode::Offset);
    assert_eq!(controller.balance(), BalanceMode::On);
}

#[test]
fn test_full_walk_for_each_direction() {
    let preview = RiccatiPreviewService::new()
        .preview_matrix(WalkingParam::default().lipm_height, CYCLE)
        .unwrap();

    for direction in [
        StepDirection::Forward,
        StepDirection::Backward,
        StepDirection::Left,
        StepDirection::Right,
        StepDirection::TurnLeft,
        StepDirection::TurnRight,
        StepDirection::Stop,
    ] {
        let mut controller = WholebodyController::new(ControllerConfig::default());
        balance(&mut controller, BalanceToken::On);
        run(&mut controller, ONE_SECOND);

        controller
            .handle_command(ControlCommand::FootStep {
                command: footstep(direction, 2),
                preview: Some(preview.clone()),
            })
            .unwrap();
        let events = run(&mut controller, 4 * 63 + 2);

        assert!(
            events.contains(&ControlEvent::MovementDone(ControlMode::Walking)),
            "{direction:?} did not finish"
        );
        assert!(
            !events.iter().any(|e| matches!(e, ControlEvent::Aborted(_))),
            "{direction:?} aborted"
        );
        assert_eq!(controller.mode(), ControlMode::None);
        assert_eq!(
            controller.desired().stance,
            StancePoses::nominal(controller.foot_distance())
        );
    }
}

// ==================== 中止 ====================

/// 输出超出腿长的躯干修正
struct RunawayController;

impl BalanceController for RunawayController {
    fn set_gains(&mut self, _gains: &BalanceGains, _ratio: f64) {}

    fn process(&mut self, _input: &BalanceInput) -> BalanceOutput {
        BalanceOutput {
            body: Pose6D::from_translation(0.0, 0.0, 1.0),
            ..BalanceOutput::default()
        }
    }

    fn reset(&mut self) {}
}

#[test]
fn test_ik_failure_aborts_in_same_tick() {
    let mut controller = WholebodyController::builder(ControllerConfig::default())
        .balance_controller(Box::new(RunawayController))
        .build();
    run(&mut controller, 1);
    let before = *controller.desired_joints();

    balance(&mut controller, BalanceToken::On);
    let events = run(&mut controller, 1);

    assert_eq!(controller.balance(), BalanceMode::Off);
    assert_eq!(controller.mode(), ControlMode::None);
    assert!(!controller.is_moving());
    assert_eq!(controller.gain_ratio(), 0.0);
    assert_eq!(
        controller.desired().stance,
        StancePoses::nominal(controller.foot_distance())
    );
    // 失败周期不写入关节角
    assert_eq!(*controller.desired_joints(), before);
    assert!(events.iter().any(|e| matches!(
        e,
        ControlEvent::Status(msg)
            if msg.level == StatusLevel::Error && msg.message == "[FAIL] Task Space Control"
    )));
}

// ==================== 性质 ====================

#[derive(Debug, Clone)]
enum Op {
    JointPose,
    BodyOffset,
    Wholebody(TaskGroup),
    FootStep,
    Balance(BalanceToken),
    Tick(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::JointPose),
        Just(Op::BodyOffset),
        prop_oneof![
            Just(TaskGroup::Body),
            Just(TaskGroup::LeftLeg),
            Just(TaskGroup::RightLeg)
        ]
        .prop_map(Op::Wholebody),
        Just(Op::FootStep),
        prop_oneof![Just(BalanceToken::On), Just(BalanceToken::Off)].prop_map(Op::Balance),
        (1usize..80).prop_map(Op::Tick),
    ]
}

fn command(op: &Op, controller: &WholebodyController) -> Option<ControlCommand> {
    let command = match op {
        Op::JointPose => ControlCommand::JointPose(JointPoseGoal {
            goals: vec![(Joint::LKnee, -0.3)],
            mov_time: 0.3,
        }),
        Op::BodyOffset => ControlCommand::BodyOffset(BodyOffset::new(0.005, 0.0, 0.0)),
        Op::Wholebody(group) => {
            let mut pose = controller.task_pose(*group);
            pose.position.z += 0.005;
            ControlCommand::Wholebody(WholebodyGoal {
                group: *group,
                mov_time: 0.3,
                pose,
            })
        },
        Op::FootStep => ControlCommand::FootStep {
            command: footstep(StepDirection::Forward, 1),
            preview: None,
        },
        Op::Balance(token) => ControlCommand::Balance {
            token: *token,
            gains: None,
        },
        Op::Tick(_) => return None,
    };
    Some(command)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_rejected_commands_keep_state(ops in prop::collection::vec(op(), 1..24)) {
        let mut controller = WholebodyController::new(ControllerConfig::default());
        run(&mut controller, 1);

        for op in &ops {
            if let Op::Tick(n) = op {
                run(&mut controller, *n);
            } else if let Some(command) = command(op, &controller) {
                let before = (controller.mode(), controller.balance());
                if let Err(ControlError::CommandRejected { .. }) = controller.handle_command(command) {
                    prop_assert_eq!((controller.mode(), controller.balance()), before);
                }
            }

            let ratio = controller.gain_ratio();
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
    }

    #[test]
    fn test_gain_ratio_monotone_during_ramp(warmup in 0usize..200, on_first in any::<bool>()) {
        let mut controller = WholebodyController::new(ControllerConfig::default());
        let (first, second) = if on_first {
            (BalanceToken::On, BalanceToken::Off)
        } else {
            (BalanceToken::Off, BalanceToken::On)
        };
        balance(&mut controller, first);
        run(&mut controller, warmup);

        balance(&mut controller, second);
        let start = controller.gain_ratio();
        let rising = second == BalanceToken::On;

        let mut last = start;
        for _ in 0..ONE_SECOND {
            run(&mut controller, 1);
            let ratio = controller.gain_ratio();
            prop_assert!((0.0..=1.0).contains(&ratio));
            if rising {
                prop_assert!(ratio >= last - 1e-12);
            } else {
                prop_assert!(ratio <= last + 1e-12);
            }
            last = ratio;
        }
        prop_assert_eq!(last, second.target_ratio());
    }
}
