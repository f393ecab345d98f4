// Copyright 2019 Dmitry Tantsur <dtantsur@protonmail.com>
//
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

use std::env;
use std::str::FromStr;

use futures::pin_mut;
use futures::stream::TryStreamExt;

use oscloud::objectstorage::ObjectStorage;

#[tokio::main]
async fn main() {
    env_logger::init();
    let limit = env::args()
        .nth(1)
        .map(|s| FromStr::from_str(&s).expect("Expected a number"));

    let session = oscloud::Session::from_env()
        .await
        .expect("Failed to create an identity provider from the environment");
    let storage = ObjectStorage::new(&session);

    let page = storage
        .list_containers(Default::default(), limit, None)
        .await
        .expect("Failed to list containers");
    let containers = page.into_stream();
    pin_mut!(containers);
    while let Some(container) = containers
        .try_next()
        .await
        .expect("Failed to fetch the next chunk")
    {
        println!(
            "Name = {}, Objects = {}, Bytes = {}",
            container.name, container.count, container.bytes
        );
    }
    println!("Done listing");
}
