// ABOUTME: Rollback command implementation.
// ABOUTME: Points the listener back at the other blue/green slot after checking it is healthy.

use atlantis_deploy::cloud::AwsCloud;
use atlantis_deploy::config::BlueGreenTargets;
use atlantis_deploy::deploy::manual_rollback;
use atlantis_deploy::error::{Error, Result};
use atlantis_deploy::output::Output;
use atlantis_deploy::types::{ListenerArn, TargetGroupArn};

use crate::cli::RollbackArgs;

pub async fn rollback(args: RollbackArgs, mut output: Output) -> Result<()> {
    if args.blue_tg == args.green_tg {
        return Err(Error::InvalidConfig(
            "blue and green target groups must differ".to_string(),
        ));
    }
    let targets = BlueGreenTargets {
        blue: TargetGroupArn::new(args.blue_tg),
        green: TargetGroupArn::new(args.green_tg),
        listener: ListenerArn::new(args.listener),
    };

    output.start_timer();
    output.progress(&format!("Rolling back listener {}", targets.listener.short()));

    let cloud = AwsCloud::from_env().await;
    let live = manual_rollback(&cloud, &targets).await?;

    output.success(&format!("Rollback complete, traffic now on {live}"));
    Ok(())
}
