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

use oscloud::objectstorage::{Metadata, ObjectOptions, ObjectStorage};

const CONTAINER: &str = "oscloud-test";
const OBJECT: &str = "dir/test-object";

#[tokio::main]
async fn main() {
    env_logger::init();

    let session = oscloud::Session::from_env()
        .await
        .expect("Failed to create an identity provider from the environment");
    let storage = ObjectStorage::new(&session);

    let result = storage
        .create_container(CONTAINER)
        .await
        .expect("Failed to create a container");
    println!("Container {}: {:?}", CONTAINER, result);

    let options = ObjectOptions::new()
        .with_content_type("text/plain")
        .with_metadata(Metadata::new().with("purpose", "demo"));
    let created = storage
        .create_object(CONTAINER, OBJECT, "Hello, world!", options)
        .await
        .expect("Failed to upload an object");
    println!("Uploaded {} with ETag {:?}", OBJECT, created.etag);

    let object = storage
        .get_object(CONTAINER, OBJECT)
        .await
        .expect("Failed to download an object");
    println!(
        "Received {:?} with metadata {:?}",
        String::from_utf8_lossy(&object.data),
        object.info.metadata
    );

    storage
        .delete_object(CONTAINER, OBJECT)
        .await
        .expect("Failed to delete an object");
    storage
        .delete_container(CONTAINER)
        .await
        .expect("Failed to delete a container");
    println!("Cleaned up");
}
