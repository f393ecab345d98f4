// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Internal utilities

use std::future::Future;
use std::time::Duration;

use log::debug;
use tokio::time::{sleep, Instant};

use super::{Error, ErrorKind};

/// Poll a resource until the check returns a value or the timeout expires.
///
/// The check returns `Ok(None)` to continue waiting. Errors are propagated immediately.
pub async fn wait_for<T, F, Fut>(
    timeout: Duration,
    delay: Duration,
    description: &str,
    mut check: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, Error>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(result) = check().await? {
            return Ok(result);
        }

        if Instant::now() + delay > deadline {
            return Err(Error::new(
                ErrorKind::OperationTimedOut,
                format!("Timeout waiting for {}", description),
            ));
        }

        debug!("Still waiting for {}, next check in {:?}", description, delay);
        sleep(delay).await;
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::wait_for;
    use crate::{Error, ErrorKind};

    #[tokio::test]
    async fn test_wait_for_success() {
        let mut attempts = 0;
        let result = wait_for(
            Duration::from_secs(5),
            Duration::from_millis(1),
            "test",
            || {
                attempts += 1;
                let current = attempts;
                async move { Ok::<_, Error>(if current >= 3 { Some(current) } else { None }) }
            },
        )
        .await
        .unwrap();
        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn test_wait_for_timeout() {
        let err = wait_for(
            Duration::from_millis(5),
            Duration::from_millis(2),
            "test",
            || async { Ok::<Option<()>, Error>(None) },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationTimedOut);
    }
}
